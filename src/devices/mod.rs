//! Device registry
//!
//! Wraps the backend's host and device discovery and hands out opaque
//! [`DeviceId`]s. An id stays valid for as long as enumeration keeps reporting
//! the same platform device; once a device disappears from a listing its id
//! is retired and every query on it fails with `DeviceNotFound`.
//!
//! Device descriptors own nothing: the platform handle is re-resolved from
//! the id each time a capability query or a stream needs it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::arena::Arena;
use crate::domain::{
    AudioError, AudioResult, ConfigRange, Device, DeviceId, DeviceKey, Direction, Host,
    PlatformDevice, SampleFormat, StreamConfig,
};
use crate::ports::AudioBackend;

#[derive(Debug, Clone)]
struct DeviceEntry {
    key: DeviceKey,
    name: String,
    is_default_input: bool,
    is_default_output: bool,
}

impl DeviceEntry {
    fn describe(&self, id: DeviceId) -> Device {
        Device {
            id,
            name: self.name.clone(),
            host_id: self.key.host_id.clone(),
            is_default_input: self.is_default_input,
            is_default_output: self.is_default_output,
            input_configs: None,
            output_configs: None,
        }
    }
}

pub struct DeviceRegistry {
    backend: Arc<dyn AudioBackend>,
    devices: Mutex<Arena<DeviceEntry>>,
}

impl DeviceRegistry {
    pub fn new(backend: Arc<dyn AudioBackend>) -> Self {
        Self {
            backend,
            devices: Mutex::new(Arena::new()),
        }
    }

    pub fn backend(&self) -> &Arc<dyn AudioBackend> {
        &self.backend
    }

    fn lock_devices(&self) -> MutexGuard<'_, Arena<DeviceEntry>> {
        self.devices.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn list_hosts(&self) -> AudioResult<Vec<Host>> {
        let hosts = self.backend.enumerate_hosts()?;
        if hosts.is_empty() {
            return Err(AudioError::PlatformUnavailable(
                "no audio hosts available".into(),
            ));
        }
        Ok(hosts)
    }

    /// Devices of `host_id`, or of the default host when `None`
    pub fn list_devices(&self, host_id: Option<&str>) -> AudioResult<Vec<Device>> {
        let host_id = match host_id {
            Some(id) => {
                if !self.list_hosts()?.iter().any(|host| host.id == id) {
                    return Err(AudioError::HostNotFound(id.to_string()));
                }
                id.to_string()
            }
            None => self.backend.default_host_id()?,
        };

        let found = self.backend.enumerate_devices(&host_id)?;
        log::debug!("Host {host_id} reports {} devices", found.len());
        Ok(self.sync_host(&host_id, found))
    }

    /// Reconcile the arena with a fresh listing of one host.
    ///
    /// Devices seen before keep their id; devices no longer listed are retired.
    fn sync_host(&self, host_id: &str, found: Vec<PlatformDevice>) -> Vec<Device> {
        let mut devices = self.lock_devices();

        let retired = devices.drain_where(|entry| {
            entry.key.host_id == host_id && !found.iter().any(|pd| pd.key == entry.key.key)
        });
        for entry in &retired {
            log::debug!("Device {} is gone", entry.name);
        }

        found
            .into_iter()
            .map(|pd| {
                let known = devices
                    .iter()
                    .find(|(_, entry)| entry.key.host_id == host_id && entry.key.key == pd.key)
                    .map(|(index, _)| index);

                let entry = DeviceEntry {
                    key: DeviceKey {
                        host_id: host_id.to_string(),
                        key: pd.key,
                    },
                    name: pd.name,
                    is_default_input: pd.is_default_input,
                    is_default_output: pd.is_default_output,
                };

                let index = match known {
                    Some(index) => {
                        devices.replace(index, entry.clone());
                        index
                    }
                    None => devices.insert(entry.clone()),
                };
                entry.describe(DeviceId(index))
            })
            .collect()
    }

    pub fn default_input_device(&self) -> AudioResult<Device> {
        self.default_device(Direction::Input)
    }

    pub fn default_output_device(&self) -> AudioResult<Device> {
        self.default_device(Direction::Output)
    }

    fn default_device(&self, direction: Direction) -> AudioResult<Device> {
        self.list_devices(None)?
            .into_iter()
            .find(|device| match direction {
                Direction::Input => device.is_default_input,
                Direction::Output => device.is_default_output,
            })
            .ok_or(AudioError::NoDefaultDevice(direction))
    }

    /// Platform key behind `id`
    pub fn resolve(&self, id: DeviceId) -> AudioResult<DeviceKey> {
        self.lock_devices()
            .get(id.index())
            .map(|entry| entry.key.clone())
            .ok_or_else(|| AudioError::DeviceNotFound(id.to_string()))
    }

    /// Descriptor without capability lists
    pub fn device(&self, id: DeviceId) -> AudioResult<Device> {
        self.lock_devices()
            .get(id.index())
            .map(|entry| entry.describe(id))
            .ok_or_else(|| AudioError::DeviceNotFound(id.to_string()))
    }

    pub fn supported_configs(
        &self,
        id: DeviceId,
        direction: Direction,
    ) -> AudioResult<Vec<ConfigRange>> {
        let key = self.resolve(id)?;
        self.backend.device_supported_configs(&key, direction)
    }

    pub fn default_config(&self, id: DeviceId, direction: Direction) -> AudioResult<StreamConfig> {
        let key = self.resolve(id)?;
        self.backend.device_default_config(&key, direction)
    }

    /// Descriptor with both capability lists filled in
    pub fn describe_device(&self, id: DeviceId) -> AudioResult<Device> {
        let mut device = self.device(id)?;
        device.input_configs = Some(self.supported_configs(id, Direction::Input)?);
        device.output_configs = Some(self.supported_configs(id, Direction::Output)?);
        Ok(device)
    }

    fn all_configs(&self, id: DeviceId) -> AudioResult<Vec<ConfigRange>> {
        let mut ranges = self.supported_configs(id, Direction::Input)?;
        ranges.extend(self.supported_configs(id, Direction::Output)?);
        Ok(ranges)
    }

    /// Distinct sample formats across both directions, in the order the driver reports them
    pub fn supported_formats(&self, id: DeviceId) -> AudioResult<Vec<SampleFormat>> {
        let mut formats = Vec::new();
        for range in self.all_configs(id)? {
            if !formats.contains(&range.sample_format) {
                formats.push(range.sample_format);
            }
        }
        Ok(formats)
    }

    /// Distinct band edges (min and max rates) across both directions, ascending
    pub fn supported_sample_rates(&self, id: DeviceId) -> AudioResult<Vec<u32>> {
        let mut rates: Vec<u32> = self
            .all_configs(id)?
            .iter()
            .flat_map(|range| [range.min_sample_rate, range.max_sample_rate])
            .collect();
        rates.sort_unstable();
        rates.dedup();
        Ok(rates)
    }

    /// Largest channel count of any band, 0 if the device reports none
    pub fn max_channels(&self, id: DeviceId) -> AudioResult<u16> {
        Ok(self
            .all_configs(id)?
            .iter()
            .map(|range| range.channels)
            .max()
            .unwrap_or(0))
    }
}
