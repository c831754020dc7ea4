use super::PciError;
use crate::{command::Runner, Host, BBSWITCH, PCI_RESCAN};
use std::{
    fs::OpenOptions,
    io::{self, Write},
    path::Path,
    thread,
};

impl<R: Runner> Host<R> {
    /// Lets the kernel runtime-suspend the Nvidia card, or keeps it powered.
    pub fn set_power_management(&self, enabled: bool) -> Result<(), PciError> {
        let mode = if enabled { "auto" } else { "on" };
        let bus_ids = self.get_bus_ids(false)?;
        self.write_to_pci(&bus_ids.nvidia.sysfs_path().join("power/control"), mode)
    }

    /// Logically detaches the Nvidia card from the PCI bus.
    pub fn disable_card(&self) -> Result<(), PciError> {
        let bus_ids = self.get_bus_ids(false)?;
        self.write_to_pci(&bus_ids.nvidia.sysfs_path().join("remove"), "1")
    }

    /// Powers the Nvidia card through bbswitch, rescanning the PCI bus if the
    /// card was previously removed from it.
    ///
    /// Both `ON` writes go to `/proc/acpi/bbswitch` rather than the card's
    /// `power/control` node: after `disable_card` the card has no sysfs
    /// directory, so only bbswitch can bring it back.
    pub fn enable_card(&self) -> Result<(), PciError> {
        self.write_to_pci(Path::new(BBSWITCH), "ON")?;

        thread::sleep(self.settle());

        match self.get_bus_ids(false) {
            Ok(_) => info!("Nvidia card is already on the PCI bus, skipping PCI rescan"),
            Err(why) => {
                info!("Nvidia card is not on the PCI bus ({}): rescanning", why);
                self.write_to_pci(Path::new(PCI_RESCAN), "1")?;
            }
        }

        self.write_to_pci(Path::new(BBSWITCH), "ON")
    }

    fn write_to_pci(&self, path: &Path, contents: &str) -> Result<(), PciError> {
        let path = self.path(path);
        info!("writing {:?} to {:?}", contents, path);

        let mut file = OpenOptions::new().write(true).truncate(true).open(&path).map_err(|why| {
            if why.kind() == io::ErrorKind::NotFound {
                PciError::PathNotFound(path.clone())
            } else {
                PciError::Write { path: path.clone(), source: why }
            }
        })?;

        file.write_all(contents.as_bytes())
            .map_err(|source| PciError::Write { path: path.clone(), source })?;

        self.record_write(&path, contents);
        Ok(())
    }
}
