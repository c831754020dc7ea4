mod service;

pub use self::service::{ServiceName, Systemd, UnitStatus};

use crate::{
    command::{CommandError, Runner},
    Host, BBSWITCH, BUMBLEBEED_SERVICE, CPUINFO, DAEMON_SERVICE, DISPLAY_MANAGER_SERVICE,
    GDM_PRIME_DIRS, LOGIN_MANAGER_SERVICE, XORG_INTEL_DRIVER,
};
use regex::Regex;
use std::{fmt, fs, io, path::PathBuf, str::FromStr};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("failed to read the GPU power state from bbswitch")]
    GpuPowerState(#[source] io::Error),

    #[error("cannot find the current mode")]
    GlxInfo(#[source] CommandError),

    #[error("no display-manager.service file found")]
    NoDisplayManager(#[source] io::Error),

    #[error("display manager service has no usable name: {:?}", _0)]
    DisplayManagerName(PathBuf),

    #[error("failed to read the state of {}", unit)]
    ServiceState { unit: String, source: dbus::Error },
}

/// The GPU currently used for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Nvidia,
    Intel,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Nvidia => "nvidia",
            Mode::Intel => "intel",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, Error)]
#[error("unknown GPU mode: {}", _0)]
pub struct ModeParseError(String);

impl FromStr for Mode {
    type Err = ModeParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim() {
            "nvidia" => Ok(Mode::Nvidia),
            "intel" => Ok(Mode::Intel),
            other => Err(ModeParseError(other.to_owned())),
        }
    }
}

impl<R: Runner> Host<R> {
    /// Whether bbswitch reports the discrete GPU as powered.
    ///
    /// Errors when the bbswitch module is not loaded.
    pub fn is_gpu_powered(&self) -> Result<bool, CheckError> {
        let state =
            fs::read_to_string(self.path(BBSWITCH)).map_err(CheckError::GpuPowerState)?;
        Ok(bbswitch_state(&state) == Some("ON"))
    }

    /// Whether the CPU advertises the PAT feature flag.
    pub fn is_pat_available(&self) -> bool {
        match fs::read_to_string(self.path(CPUINFO)) {
            Ok(cpuinfo) => has_pat_flag(&cpuinfo),
            Err(why) => {
                debug!("unable to read {}: {}", CPUINFO, why);
                false
            }
        }
    }

    pub fn read_gpu_mode(&self) -> Result<Mode, CheckError> {
        let output = self.runner().run("glxinfo", &[]).map_err(CheckError::GlxInfo)?;
        Ok(if output.contains("NVIDIA") { Mode::Nvidia } else { Mode::Intel })
    }

    pub fn is_module_available(&self, module: &str) -> bool {
        self.runner().run("modinfo", &[module]).is_ok()
    }

    /// Name of the display manager that `display-manager.service` points to.
    pub fn get_current_display_manager(&self) -> Result<ServiceName, CheckError> {
        let target = fs::canonicalize(self.path(DISPLAY_MANAGER_SERVICE))
            .map_err(CheckError::NoDisplayManager)?;

        if !target.is_file() {
            return Err(CheckError::NoDisplayManager(io::Error::new(
                io::ErrorKind::NotFound,
                "display-manager.service does not resolve to a file",
            )));
        }

        target
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(ServiceName::from)
            .ok_or_else(|| CheckError::DisplayManagerName(target.clone()))
    }

    /// Whether GDM carries the PRIME patch.
    pub fn using_patched_gdm(&self) -> bool {
        GDM_PRIME_DIRS.iter().any(|dir| self.path(dir).is_dir())
    }

    pub fn is_xorg_intel_module_available(&self) -> bool {
        self.path(XORG_INTEL_DRIVER).is_file()
    }

    pub fn is_login_manager_active(
        &self,
        bus: Option<&dyn UnitStatus>,
    ) -> Result<bool, CheckError> {
        self.is_service_active(bus, &ServiceName::from(LOGIN_MANAGER_SERVICE))
    }

    pub fn is_daemon_active(&self, bus: Option<&dyn UnitStatus>) -> Result<bool, CheckError> {
        self.is_service_active(bus, &ServiceName::from(DAEMON_SERVICE))
    }

    pub fn is_bumblebeed_service_active(
        &self,
        bus: Option<&dyn UnitStatus>,
    ) -> Result<bool, CheckError> {
        self.is_service_active(bus, &ServiceName::from(BUMBLEBEED_SERVICE))
    }
}

/// The state field of a bbswitch line, such as `0000:01:00.0 ON`.
fn bbswitch_state(contents: &str) -> Option<&str> { contents.split_whitespace().nth(1) }

fn has_pat_flag(cpuinfo: &str) -> bool {
    Regex::new(r"(?m)^flags.+ pat( |$)").expect("bad regex for pat flag").is_match(cpuinfo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::fake::{Reply, Script};
    use std::os::unix::fs::symlink;
    use tempfile::TempDir;
    use test_case::test_case;

    fn fixture(script: Script) -> (TempDir, Host<Script>) {
        let root = tempfile::tempdir().unwrap();
        let host = Host::with_root(root.path(), script);
        (root, host)
    }

    fn write(root: &TempDir, path: &str, contents: &str) {
        let path = root.path().join(path.trim_start_matches('/'));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test_case("0000:01:00.0 ON\n" => true ; "powered")]
    #[test_case("0000:01:00.0 OFF\n" => false ; "unpowered")]
    #[test_case("" => false ; "empty")]
    fn gpu_power(contents: &str) -> bool {
        let (root, host) = fixture(Script::default());
        write(&root, BBSWITCH, contents);
        host.is_gpu_powered().unwrap()
    }

    #[test]
    fn gpu_power_without_bbswitch() {
        let (_root, host) = fixture(Script::default());
        assert!(matches!(host.is_gpu_powered(), Err(CheckError::GpuPowerState(_))));
    }

    #[test_case("flags\t\t: fpu vme de pse tsc msr pae mce cx8 apic sep mtrr pge mca cmov pat pse36\n" => true ; "pat in the middle")]
    #[test_case("flags\t\t: fpu vme pat\n" => true ; "pat at the end")]
    #[test_case("flags\t\t: fpu vme pse36 patx\n" => false ; "prefix only")]
    #[test_case("model name\t: pat\nflags\t\t: fpu\n" => false ; "pat outside flags")]
    fn pat_flag(cpuinfo: &str) -> bool { has_pat_flag(cpuinfo) }

    #[test]
    fn pat_unreadable_cpuinfo() {
        let (_root, host) = fixture(Script::default());
        assert!(!host.is_pat_available());
    }

    #[test]
    fn gpu_mode() {
        let (_root, host) =
            fixture(Script::default().stdout("glxinfo", "OpenGL vendor string: NVIDIA Corporation\n"));
        assert_eq!(host.read_gpu_mode().unwrap(), Mode::Nvidia);

        let (_root, host) =
            fixture(Script::default().stdout("glxinfo", "OpenGL vendor string: Intel\n"));
        assert_eq!(host.read_gpu_mode().unwrap(), Mode::Intel);

        let (_root, host) = fixture(Script::default());
        assert!(matches!(host.read_gpu_mode(), Err(CheckError::GlxInfo(_))));

        let (_root, host) = fixture(Script::default().reply("glxinfo", Reply::Exit(1)));
        assert!(matches!(host.read_gpu_mode(), Err(CheckError::GlxInfo(_))));
    }

    #[test]
    fn mode_strings() {
        assert_eq!(Mode::Nvidia.to_string(), "nvidia");
        assert_eq!("intel\n".parse::<Mode>().unwrap(), Mode::Intel);
        assert!("hybrid".parse::<Mode>().is_err());
    }

    #[test]
    fn module_availability() {
        let (_root, host) = fixture(Script::default().stdout("modinfo", "filename: bbswitch.ko\n"));
        assert!(host.is_module_available("bbswitch"));

        let (_root, host) = fixture(Script::default().reply("modinfo", Reply::Exit(1)));
        assert!(!host.is_module_available("nvidia"));

        let (_root, host) = fixture(Script::default());
        assert!(!host.is_module_available("nvidia"));
    }

    #[test]
    fn display_manager_from_symlink() {
        let (root, host) = fixture(Script::default());
        write(&root, "/usr/lib/systemd/system/sddm.service", "[Unit]\n");

        let link = root.path().join("etc/systemd/system/display-manager.service");
        fs::create_dir_all(link.parent().unwrap()).unwrap();
        symlink(root.path().join("usr/lib/systemd/system/sddm.service"), &link).unwrap();

        assert_eq!(host.get_current_display_manager().unwrap().as_str(), "sddm");
    }

    #[test]
    fn display_manager_missing() {
        let (_root, host) = fixture(Script::default());
        assert!(matches!(
            host.get_current_display_manager(),
            Err(CheckError::NoDisplayManager(_))
        ));
    }

    #[test]
    fn patched_gdm() {
        let (root, host) = fixture(Script::default());
        assert!(!host.using_patched_gdm());

        fs::create_dir_all(root.path().join("etc/gdm3/Prime")).unwrap();
        assert!(host.using_patched_gdm());
    }

    #[test]
    fn xorg_intel_driver() {
        let (root, host) = fixture(Script::default());
        assert!(!host.is_xorg_intel_module_available());

        write(&root, XORG_INTEL_DRIVER, "");
        assert!(host.is_xorg_intel_module_available());
    }
}
