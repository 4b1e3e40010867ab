//! Error taxonomy for the charging core.
//!
//! [`ErrorCode`] is the value latched by the fault registry and shown on the
//! display.  Collaborator errors ([`AdcError`], [`MeterError`]) and
//! [`ConfigError`] are separate so that a leaf can report precisely what
//! failed while the registry only carries the system-level code.
//! All variants are `Copy` so they pass through the FSM context without
//! allocation.

use core::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Latched error codes
// ---------------------------------------------------------------------------

/// System error codes.  `None` means "no fault latched".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum ErrorCode {
    #[default]
    None = 0,
    /// Unspecified failure (also used for an operator abort).
    Unknown = 1,
    /// A collaborator did not answer in time.
    Timeout = 2,
    /// A receive buffer overflowed and data was dropped.
    BufferFull = 3,

    // ── Initialisation ───────────────────────────────────
    UartInitFailed = 10,
    PwmInitFailed = 11,
    AdcInitFailed = 12,
    WatchdogInitFailed = 13,
    TickInitFailed = 14,
    GpioInitFailed = 15,

    // ── Energy meter link ────────────────────────────────
    HlwChecksum = 20,
    HlwUartTimeout = 21,
    HlwFrame = 22,

    // ── Charging process / safety ────────────────────────
    /// Control Pilot voltage outside every valid band.
    CpVoltageInvalid = 30,
    /// Proximity Pilot resistance outside every cable band.
    PpResistanceInvalid = 31,
    /// Contactor failed to switch, or feedback disagrees with the command.
    ContactorFault = 32,
    Overcurrent = 33,
    Overvoltage = 34,
    Undervoltage = 35,
    TemperatureHigh = 36,
    GfciFault = 37,
    /// Handshake reached a state the station does not support.
    StateInvalid = 38,
}

/// How the orchestrator treats a reported code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Peripheral bring-up failed.  Latches `Fault` until reset.
    Fatal,
    /// Power must be removed immediately.
    SafetyCritical,
    /// A pilot signal is out of range.
    SignalRange,
    /// Logged only; never latched and never fatal to the tick.
    Transient,
}

impl ErrorCode {
    pub const fn severity(self) -> Severity {
        match self {
            Self::UartInitFailed
            | Self::PwmInitFailed
            | Self::AdcInitFailed
            | Self::WatchdogInitFailed
            | Self::TickInitFailed
            | Self::GpioInitFailed => Severity::Fatal,
            Self::CpVoltageInvalid | Self::PpResistanceInvalid | Self::StateInvalid => {
                Severity::SignalRange
            }
            Self::Timeout
            | Self::BufferFull
            | Self::HlwChecksum
            | Self::HlwUartTimeout
            | Self::HlwFrame => Severity::Transient,
            // `None` never reaches a severity decision.
            Self::None
            | Self::Unknown
            | Self::ContactorFault
            | Self::Overcurrent
            | Self::Overvoltage
            | Self::Undervoltage
            | Self::TemperatureHigh
            | Self::GfciFault => Severity::SafetyCritical,
        }
    }

    pub const fn is_none(self) -> bool {
        matches!(self, Self::None)
    }

    /// True if the CP-A / contactor-open recovery may clear this code.
    pub const fn is_recoverable(self) -> bool {
        !matches!(self.severity(), Severity::Fatal)
    }

    /// True if the code belongs in the latched registry slot.
    pub const fn latches(self) -> bool {
        !self.is_none() && !matches!(self.severity(), Severity::Transient)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::None => "no error",
            Self::Unknown => "unknown error",
            Self::Timeout => "timeout",
            Self::BufferFull => "buffer full",
            Self::UartInitFailed => "UART init failed",
            Self::PwmInitFailed => "PWM init failed",
            Self::AdcInitFailed => "ADC init failed",
            Self::WatchdogInitFailed => "watchdog init failed",
            Self::TickInitFailed => "tick timer init failed",
            Self::GpioInitFailed => "GPIO init failed",
            Self::HlwChecksum => "meter checksum mismatch",
            Self::HlwUartTimeout => "meter link timeout",
            Self::HlwFrame => "meter framing error",
            Self::CpVoltageInvalid => "CP voltage invalid",
            Self::PpResistanceInvalid => "PP resistance invalid",
            Self::ContactorFault => "contactor fault",
            Self::Overcurrent => "overcurrent",
            Self::Overvoltage => "overvoltage",
            Self::Undervoltage => "undervoltage",
            Self::TemperatureHigh => "temperature high",
            Self::GfciFault => "ground fault",
            Self::StateInvalid => "invalid handshake state",
        };
        f.write_str(text)
    }
}

// ---------------------------------------------------------------------------
// ADC collaborator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdcError {
    /// Conversion did not complete (the driver returned its 0xFFFF sentinel).
    Timeout,
    /// Requested channel is not wired to the converter.
    InvalidChannel,
}

impl fmt::Display for AdcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "ADC conversion timeout"),
            Self::InvalidChannel => write!(f, "ADC channel invalid"),
        }
    }
}

// ---------------------------------------------------------------------------
// Energy meter errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeterError {
    Checksum,
    Frame,
    Timeout,
    Overrun,
}

impl MeterError {
    /// Registry code used when the failure is logged.
    pub const fn code(self) -> ErrorCode {
        match self {
            Self::Checksum => ErrorCode::HlwChecksum,
            Self::Frame => ErrorCode::HlwFrame,
            Self::Timeout => ErrorCode::HlwUartTimeout,
            Self::Overrun => ErrorCode::BufferFull,
        }
    }
}

impl fmt::Display for MeterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Checksum => write!(f, "meter packet checksum mismatch"),
            Self::Frame => write!(f, "meter packet framing error"),
            Self::Timeout => write!(f, "meter packet timeout"),
            Self::Overrun => write!(f, "meter receive overrun"),
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A field failed range validation.  The string names the field and rule.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl core::error::Error for ConfigError {}
