use crate::{
    checks::{Mode, ServiceName, UnitStatus},
    command::Runner,
    misc::format_error,
    pci::GpuBusMap,
    Host,
};
use std::fmt;

/// A snapshot of every hardware probe. Failing probes are recorded as their
/// error message rather than aborting the snapshot.
#[derive(Debug)]
pub struct Status {
    pub bus_ids:              Result<GpuBusMap, String>,
    pub gpu_mode:             Result<Mode, String>,
    pub gpu_powered:          Result<bool, String>,
    pub display_manager:      Result<ServiceName, String>,
    pub login_manager_active: Result<bool, String>,
    pub daemon_active:        Result<bool, String>,
    pub bumblebeed_active:    Result<bool, String>,
    pub bbswitch_module:      bool,
    pub nvidia_module:        bool,
    pub pat_available:        bool,
    pub patched_gdm:          bool,
    pub xorg_intel_driver:    bool,
}

impl Status {
    pub fn gather<R: Runner>(host: &Host<R>, bus: Option<&dyn UnitStatus>) -> Self {
        fn text<T, E: std::error::Error + 'static>(result: Result<T, E>) -> Result<T, String> {
            result.map_err(|why| format_error(&why))
        }

        Status {
            bus_ids:              text(host.get_bus_ids(false)),
            gpu_mode:             text(host.read_gpu_mode()),
            gpu_powered:          text(host.is_gpu_powered()),
            display_manager:      text(host.get_current_display_manager()),
            login_manager_active: text(host.is_login_manager_active(bus)),
            daemon_active:        text(host.is_daemon_active(bus)),
            bumblebeed_active:    text(host.is_bumblebeed_service_active(bus)),
            bbswitch_module:      host.is_module_available("bbswitch"),
            nvidia_module:        host.is_module_available("nvidia"),
            pat_available:        host.is_pat_available(),
            patched_gdm:          host.using_patched_gdm(),
            xorg_intel_driver:    host.is_xorg_intel_module_available(),
        }
    }
}

fn line<T: fmt::Display>(
    f: &mut fmt::Formatter,
    key: &str,
    value: &Result<T, String>,
) -> fmt::Result {
    match value {
        Ok(value) => writeln!(f, "{}: {}", key, value),
        Err(why) => writeln!(f, "{}: unknown ({})", key, why),
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let bus_ids = self.bus_ids.as_ref().map(|map| {
            fomat!("nvidia=" (map.nvidia) " intel=" (map.intel))
        });

        line(f, "bus ids", &bus_ids.map_err(Clone::clone))?;
        line(f, "gpu mode", &self.gpu_mode)?;
        line(f, "gpu powered", &self.gpu_powered)?;
        line(f, "display manager", &self.display_manager)?;
        line(f, "login manager active", &self.login_manager_active)?;
        line(f, "optimus daemon active", &self.daemon_active)?;
        line(f, "bumblebeed active", &self.bumblebeed_active)?;
        writeln!(f, "bbswitch module: {}", self.bbswitch_module)?;
        writeln!(f, "nvidia module: {}", self.nvidia_module)?;
        writeln!(f, "pat available: {}", self.pat_available)?;
        writeln!(f, "patched gdm: {}", self.patched_gdm)?;
        write!(f, "xorg intel driver: {}", self.xorg_intel_driver)
    }
}
