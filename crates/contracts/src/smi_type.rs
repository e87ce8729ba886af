//! SmiType - the ICHn SMI source sub-types a child can register for.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ContractError;

macro_rules! smi_types {
    ($( $(#[$doc:meta])* $variant:ident => $name:literal, )+) => {
        /// ICHn SMI source sub-type
        ///
        /// The discriminant is the raw value used on the wire and in status
        /// registers; it is stable and dense from `0`.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[repr(u32)]
        pub enum SmiType {
            $( $(#[$doc])* #[serde(rename = $name)] $variant, )+
        }

        impl SmiType {
            /// Every sub-type, in raw-value order
            pub const ALL: &'static [SmiType] = &[$(SmiType::$variant),+];

            /// Configuration name (snake_case)
            pub const fn name(self) -> &'static str {
                match self {
                    $(SmiType::$variant => $name,)+
                }
            }
        }
    };
}

smi_types! {
    /// Memory controller hub
    Mch => "mch",
    Pme => "pme",
    RtcAlarm => "rtc_alarm",
    RingIndicate => "ring_indicate",
    Ac97Wake => "ac97_wake",
    SerialIrq => "serial_irq",
    Y2KRollover => "y2k_rollover",
    /// TCO watchdog timeout
    TcoTimeout => "tco_timeout",
    OsTco => "os_tco",
    Nmi => "nmi",
    IntruderDetect => "intruder_detect",
    /// BIOS write-protect violation
    BiosWp => "bios_wp",
    McSmi => "mc_smi",
    PmeB0 => "pme_b0",
    ThrmSts => "thrm_sts",
    SmBus => "smbus",
    IntelUsb2 => "intel_usb2",
    MonSmi7 => "mon_smi7",
    MonSmi6 => "mon_smi6",
    MonSmi5 => "mon_smi5",
    MonSmi4 => "mon_smi4",
    DevTrap13 => "dev_trap13",
    DevTrap12 => "dev_trap12",
    DevTrap11 => "dev_trap11",
    DevTrap10 => "dev_trap10",
    DevTrap9 => "dev_trap9",
    DevTrap8 => "dev_trap8",
    DevTrap7 => "dev_trap7",
    DevTrap6 => "dev_trap6",
    DevTrap5 => "dev_trap5",
    DevTrap3 => "dev_trap3",
    DevTrap2 => "dev_trap2",
    DevTrap1 => "dev_trap1",
    DevTrap0 => "dev_trap0",
    IoTrap3 => "io_trap3",
    IoTrap2 => "io_trap2",
    IoTrap1 => "io_trap1",
    IoTrap0 => "io_trap0",
    PciExpress => "pci_express",
    Monitor => "monitor",
    Spi => "spi",
    /// Quick resume technology
    Qrt => "qrt",
    GpioUnlock => "gpio_unlock",
}

impl SmiType {
    /// Number of defined sub-types
    pub const COUNT: usize = Self::ALL.len();

    /// Raw discriminant
    #[inline]
    pub const fn as_raw(self) -> u32 {
        self as u32
    }

    /// Decode a raw discriminant; `None` if out of range
    #[inline]
    pub fn from_raw(raw: u32) -> Option<Self> {
        Self::ALL.get(raw as usize).copied()
    }
}

impl fmt::Display for SmiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SmiType {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ContractError::UnknownSmiType(s.to_string()))
    }
}
