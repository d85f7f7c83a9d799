/// I2C address of the status microcontroller.
pub const STATUS_ADDRESS: u8 = 0x3E;
/// I2C address of the FRU EEPROM.
pub const EEPROM_ADDRESS: u8 = 0x56;

/// Bit positions in the status register.
pub mod bits {
    pub const OCP_12V: u8 = 0;
    pub const FAN_FAULT: u8 = 1;
    pub const UVP_12V: u8 = 2;
    pub const OVP_12V: u8 = 3;
    pub const VIN_GOOD: u8 = 4;
    pub const P_GOOD: u8 = 5;
    pub const PS_STATUS: u8 = 6;
    pub const AC_PFAIL: u8 = 7;
}

/// The eight flags of the status register, decoded as a group.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct StatusFlags {
    /// 12V over-current protection tripped
    pub ocp_12v: bool,
    /// Fan failure
    pub fan_fault: bool,
    /// 12V under-voltage protection tripped
    pub uvp_12v: bool,
    /// 12V over-voltage protection tripped
    pub ovp_12v: bool,
    /// AC input within range
    pub vin_good: bool,
    /// Main outputs within regulation
    pub p_good: bool,
    /// Supply status
    pub ps_status: bool,
    /// AC power failure
    pub ac_pfail: bool,
}

impl StatusFlags {
    pub const fn from_register(reg: u8) -> Self {
        const fn bit(reg: u8, n: u8) -> bool {
            (reg >> n) & 0x01 != 0
        }

        Self {
            ocp_12v: bit(reg, bits::OCP_12V),
            fan_fault: bit(reg, bits::FAN_FAULT),
            uvp_12v: bit(reg, bits::UVP_12V),
            ovp_12v: bit(reg, bits::OVP_12V),
            vin_good: bit(reg, bits::VIN_GOOD),
            p_good: bit(reg, bits::P_GOOD),
            ps_status: bit(reg, bits::PS_STATUS),
            ac_pfail: bit(reg, bits::AC_PFAIL),
        }
    }

    pub const fn to_register(&self) -> u8 {
        (self.ocp_12v as u8) << bits::OCP_12V
            | (self.fan_fault as u8) << bits::FAN_FAULT
            | (self.uvp_12v as u8) << bits::UVP_12V
            | (self.ovp_12v as u8) << bits::OVP_12V
            | (self.vin_good as u8) << bits::VIN_GOOD
            | (self.p_good as u8) << bits::P_GOOD
            | (self.ps_status as u8) << bits::PS_STATUS
            | (self.ac_pfail as u8) << bits::AC_PFAIL
    }

    /// True if any protection, fan or AC failure flag is raised.
    pub const fn has_fault(&self) -> bool {
        self.ocp_12v || self.fan_fault || self.uvp_12v || self.ovp_12v || self.ac_pfail
    }
}

impl From<u8> for StatusFlags {
    fn from(reg: u8) -> Self {
        Self::from_register(reg)
    }
}

impl From<StatusFlags> for u8 {
    fn from(flags: StatusFlags) -> u8 {
        flags.to_register()
    }
}
