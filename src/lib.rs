#![deny(clippy::all)]

#[macro_use]
extern crate cascade;

#[macro_use]
extern crate fomat_macros;

#[macro_use]
extern crate log;

#[macro_use]
extern crate shrinkwraprs;

/// Read-only probes of the GPU, display manager, and service state
pub mod checks;

/// Execution of external diagnostic commands
pub mod command;

/// Miscellaneous functions used throughout the library.
pub mod misc;

/// Discovery of the hybrid GPU pair, and power control of the Nvidia card
pub mod pci;

/// Aggregated report of every hardware probe
pub mod status;

mod host;

pub use self::host::Host;

pub const BBSWITCH: &str = "/proc/acpi/bbswitch";
pub const CPUINFO: &str = "/proc/cpuinfo";
pub const DISPLAY_MANAGER_SERVICE: &str = "/etc/systemd/system/display-manager.service";
pub const GDM_PRIME_DIRS: [&str; 2] = ["/etc/gdm/Prime", "/etc/gdm3/Prime"];
pub const XORG_INTEL_DRIVER: &str = "/usr/lib/xorg/modules/drivers/intel_drv.so";

pub const PCI_DEVICES: &str = "/sys/bus/pci/devices";
pub const PCI_RESCAN: &str = "/sys/bus/pci/rescan";

pub const DAEMON_SERVICE: &str = "optimus-manager";
pub const BUMBLEBEED_SERVICE: &str = "bumblebeed";
pub const LOGIN_MANAGER_SERVICE: &str = "display-manager";
