use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use strum::{EnumCount, EnumIter, IntoEnumIterator};

/// Number of configuration registers exchanged with the device.
pub const REGISTER_COUNT: usize = RegisterSetting::COUNT;

/// Register values in device order, one per [`RegisterSetting`].
pub type RegisterValues = [u16; REGISTER_COUNT];

/// Name of a serial device as reported by the backend (`COM3`, `/dev/ttyUSB0`, ...).
///
/// A `Port` is never empty; construct it through [`FromStr`] or [`Port::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Port(String);

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("port name must not be empty")]
pub struct EmptyPortName;

impl Port {
    pub fn new(name: impl Into<String>) -> Result<Self, EmptyPortName> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(EmptyPortName);
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Port {
    type Err = EmptyPortName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Device settings backed by the eight holding registers, in register order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount, strum::Display)]
pub enum RegisterSetting {
    #[strum(to_string = "Output Voltage")]
    OutputVoltage,
    #[strum(to_string = "Constant Voltage")]
    ConstantVoltage,
    #[strum(to_string = "Floating Voltage")]
    FloatingVoltage,
    #[strum(to_string = "CC Charge Timeout")]
    CcChargeTimeout,
    #[strum(to_string = "CV Charge Timeout")]
    CvChargeTimeout,
    #[strum(to_string = "FV Charge Timeout")]
    FvChargeTimeout,
    #[strum(to_string = "BAT_LOW Protect")]
    BatLowProtect,
    #[strum(to_string = "Force BAT_LOW Protect")]
    ForceBatLowProtect,
}

impl RegisterSetting {
    /// Setting stored at register `index`, if any.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::iter().nth(index)
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Last values read from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RegisterSnapshot {
    pub values: RegisterValues,
}

impl RegisterSnapshot {
    pub fn new(values: RegisterValues) -> Self {
        Self { values }
    }

    pub fn get(&self, setting: RegisterSetting) -> u16 {
        self.values[setting.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (RegisterSetting, u16)> + '_ {
        RegisterSetting::iter().zip(self.values.iter().copied())
    }
}

impl TryFrom<Vec<u16>> for RegisterSnapshot {
    type Error = usize;

    /// Fails with the received length when it is not exactly [`REGISTER_COUNT`].
    fn try_from(values: Vec<u16>) -> Result<Self, Self::Error> {
        let len = values.len();
        let values: RegisterValues = values.try_into().map_err(|_| len)?;
        Ok(Self { values })
    }
}

/// `GET /api/list` response body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListResponse {
    #[serde(default)]
    pub ports: Vec<String>,
}

/// `GET /api/read` response body. `registers` is optional so a missing field
/// can be reported as a read failure rather than a generic decode error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadResponse {
    #[serde(default)]
    pub registers: Option<Vec<u16>>,
}

/// `POST /api/submit` request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitBody {
    pub port: String,
    pub values: Vec<u16>,
}

impl SubmitBody {
    pub fn new(port: &Port, values: &RegisterValues) -> Self {
        Self {
            port: port.to_string(),
            values: values.to_vec(),
        }
    }
}
