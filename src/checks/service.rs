use super::CheckError;
use crate::{command::Runner, Host};
use dbus::{
    blocking::{stdintf::org_freedesktop_dbus::Properties, Connection},
    Path,
};
use std::{fmt, time::Duration};

const SYSTEMD_DEST: &str = "org.freedesktop.systemd1";
const SYSTEMD_PATH: &str = "/org/freedesktop/systemd1";
const SYSTEMD_MANAGER: &str = "org.freedesktop.systemd1.Manager";
const SYSTEMD_UNIT: &str = "org.freedesktop.systemd1.Unit";
const TIMEOUT: Duration = Duration::from_secs(5);

/// Base name of a systemd service, without the `.service` suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Shrinkwrap)]
pub struct ServiceName(String);

impl ServiceName {
    pub fn as_str(&self) -> &str { &self.0 }

    pub fn unit(&self) -> String { format!("{}.service", self.0) }
}

impl From<&str> for ServiceName {
    fn from(name: &str) -> Self { ServiceName(name.to_owned()) }
}

impl From<String> for ServiceName {
    fn from(name: String) -> Self { ServiceName(name) }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { f.write_str(&self.0) }
}

/// Access to the `SubState` of systemd units.
pub trait UnitStatus {
    /// `Ok(None)` when systemd does not know the unit.
    fn sub_state(&self, unit: &str) -> Result<Option<String>, CheckError>;
}

/// A connection to systemd over the system bus.
pub struct Systemd {
    connection: Connection,
}

impl Systemd {
    pub fn connect() -> Result<Self, dbus::Error> {
        Connection::new_system().map(|connection| Systemd { connection })
    }
}

impl UnitStatus for Systemd {
    fn sub_state(&self, unit: &str) -> Result<Option<String>, CheckError> {
        let manager = self.connection.with_proxy(SYSTEMD_DEST, SYSTEMD_PATH, TIMEOUT);

        let result: Result<(Path<'static>,), dbus::Error> =
            manager.method_call(SYSTEMD_MANAGER, "GetUnit", (unit,));

        let path = match result {
            Ok((path,)) => path,
            Err(why) => {
                debug!("systemd has no unit {}: {}", unit, why);
                return Ok(None);
            }
        };

        let unit_proxy = self.connection.with_proxy(SYSTEMD_DEST, path, TIMEOUT);
        unit_proxy
            .get::<String>(SYSTEMD_UNIT, "SubState")
            .map(Some)
            .map_err(|source| CheckError::ServiceState { unit: unit.to_owned(), source })
    }
}

impl<R: Runner> Host<R> {
    /// Whether the given service is running.
    ///
    /// Without a system bus, `systemctl is-active` decides instead.
    pub fn is_service_active(
        &self,
        bus: Option<&dyn UnitStatus>,
        service: &ServiceName,
    ) -> Result<bool, CheckError> {
        let bus = match bus {
            Some(bus) => bus,
            None => {
                warn!(
                    "cannot communicate with the system bus to check status of {}: falling back \
                     to systemctl",
                    service
                );
                return Ok(self.is_service_active_systemctl(service));
            }
        };

        let state = bus.sub_state(&service.unit())?;
        debug!("{} state: {:?}", service, state);
        Ok(state.as_deref() == Some("running"))
    }

    fn is_service_active_systemctl(&self, service: &ServiceName) -> bool {
        self.runner().run("systemctl", &["is-active", service.as_str()]).is_ok()
    }
}
