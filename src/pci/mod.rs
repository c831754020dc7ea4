mod power;

use crate::{
    command::{CommandError, Runner},
    Host,
};
use std::{fmt, io, path::PathBuf, str::FromStr};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PciError {
    #[error("cannot run lspci -n")]
    Lspci(#[source] CommandError),

    #[error("malformed display controller entry in lspci output: {}", _0)]
    Malformed(String),

    #[error("multiple {} GPUs found", _0)]
    MultipleGpus(Vendor),

    #[error("cannot find {} GPU in PCI devices list", _0)]
    NotFound(Vendor),

    #[error("cannot find PCI path at {:?}", _0)]
    PathNotFound(PathBuf),

    #[error("error writing to {:?}", path)]
    Write { path: PathBuf, source: io::Error },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vendor {
    Nvidia,
    Intel,
}

impl Vendor {
    pub const fn id(self) -> u16 {
        match self {
            Vendor::Nvidia => 0x10DE,
            Vendor::Intel => 0x8086,
        }
    }

    pub fn from_id(id: u16) -> Option<Self> {
        [Vendor::Nvidia, Vendor::Intel].iter().copied().find(|vendor| vendor.id() == id)
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Vendor::Nvidia => "Nvidia",
            Vendor::Intel => "Intel",
        })
    }
}

/// How a `BusAddress` is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Notation {
    /// Hexadecimal, as listed by lspci and sysfs: `3c:00.0`
    Raw,
    /// Decimal, as expected by the `BusID` option of Xorg: `PCI:60:0:0`
    Xorg,
}

/// Location of a device on PCI domain 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BusAddress {
    pub bus:      u8,
    pub device:   u8,
    pub function: u8,
    notation:     Notation,
}

impl BusAddress {
    pub const fn new(bus: u8, device: u8, function: u8) -> Self {
        BusAddress { bus, device, function, notation: Notation::Raw }
    }

    pub fn notation(self) -> Notation { self.notation }

    pub fn with_notation(self, notation: Notation) -> Self { BusAddress { notation, ..self } }

    /// Directory of this device in sysfs.
    pub fn sysfs_path(self) -> PathBuf {
        let raw = self.with_notation(Notation::Raw);
        PathBuf::from(crate::PCI_DEVICES).join(fomat!("0000:"(raw)))
    }
}

impl fmt::Display for BusAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.notation {
            Notation::Raw => write!(f, "{:02x}:{:02x}.{:x}", self.bus, self.device, self.function),
            Notation::Xorg => write!(f, "PCI:{}:{}:{}", self.bus, self.device, self.function),
        }
    }
}

#[derive(Debug, Error)]
#[error("invalid PCI bus address: {}", _0)]
pub struct AddressParseError(String);

impl FromStr for BusAddress {
    type Err = AddressParseError;

    /// Parses the `bus:device.function` form printed by lspci.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = || AddressParseError(input.to_owned());

        let mut fields = input.split(|c| c == ':' || c == '.');
        let mut next = || {
            fields.next().and_then(|field| u8::from_str_radix(field, 16).ok()).ok_or_else(invalid)
        };

        let address = BusAddress::new(next()?, next()?, next()?);

        if fields.next().is_some() {
            return Err(invalid());
        }

        Ok(address)
    }
}

/// Addresses of the two GPUs of a hybrid graphics laptop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuBusMap {
    pub nvidia: BusAddress,
    pub intel:  BusAddress,
}

impl GpuBusMap {
    pub fn get(&self, vendor: Vendor) -> BusAddress {
        match vendor {
            Vendor::Nvidia => self.nvidia,
            Vendor::Intel => self.intel,
        }
    }

    /// Builds the map from the output of `lspci -n`.
    pub fn from_lspci(output: &str, notation: Notation) -> Result<Self, PciError> {
        let mut nvidia = None;
        let mut intel = None;

        for line in output.lines().filter(|line| !line.trim().is_empty()) {
            let mut fields = line.split_whitespace();
            let (address, class, ids) = match (fields.next(), fields.next(), fields.next()) {
                (Some(address), Some(class), Some(ids)) => (address, class, ids),
                _ => continue,
            };

            // Display controllers are identified by a 03xx class
            if !class.starts_with("03") {
                continue;
            }

            let vendor = ids
                .split(':')
                .next()
                .and_then(|vendor| u16::from_str_radix(vendor, 16).ok())
                .and_then(Vendor::from_id);

            let vendor = match vendor {
                Some(vendor) => vendor,
                None => continue,
            };

            let slot = match vendor {
                Vendor::Nvidia => &mut nvidia,
                Vendor::Intel => &mut intel,
            };

            if slot.is_some() {
                return Err(PciError::MultipleGpus(vendor));
            }

            let address = address
                .parse::<BusAddress>()
                .map_err(|_| PciError::Malformed(line.to_owned()))?;

            debug!("found {} display controller at {}", vendor, address);
            *slot = Some(address.with_notation(notation));
        }

        Ok(GpuBusMap {
            nvidia: nvidia.ok_or(PciError::NotFound(Vendor::Nvidia))?,
            intel:  intel.ok_or(PciError::NotFound(Vendor::Intel))?,
        })
    }
}

impl<R: Runner> Host<R> {
    /// Locates the Nvidia and Intel display controllers.
    ///
    /// With `fix_notation`, addresses render in the Xorg `BusID` notation.
    pub fn get_bus_ids(&self, fix_notation: bool) -> Result<GpuBusMap, PciError> {
        let output = self.runner().run("lspci", &["-n"]).map_err(PciError::Lspci)?;
        let notation = if fix_notation { Notation::Xorg } else { Notation::Raw };
        GpuBusMap::from_lspci(&output, notation)
    }
}
