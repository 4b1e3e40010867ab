//! Main AC contactor driver with auxiliary-contact feedback.
//!
//! Drives the coil through an `OutputPin` and samples the mirror contact
//! through an `InputPin`.  Both polarities come from config.
//!
//! ## Safety contract
//!
//! This driver never verifies its own commands.  The state machine reads
//! [`ContactorController::read_feedback`] after the settle deadline and
//! decides.  A failed coil write is logged; the mismatch it causes is
//! caught by that verification.

use embedded_hal::digital::{InputPin, OutputPin};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::ContactorPolarity;

/// Last commanded position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactorIntent {
    Open,
    Closed,
}

/// Position reported by the auxiliary contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactorPhysical {
    Open,
    Closed,
    /// The feedback pin could not be sampled.
    Unknown,
}

impl From<ContactorIntent> for ContactorPhysical {
    /// Position a healthy contactor reaches after settling.
    fn from(intent: ContactorIntent) -> Self {
        match intent {
            ContactorIntent::Open => Self::Open,
            ContactorIntent::Closed => Self::Closed,
        }
    }
}

pub struct ContactorController<O, I> {
    coil: O,
    aux: I,
    polarity: ContactorPolarity,
    intent: ContactorIntent,
}

impl<O: OutputPin, I: InputPin> ContactorController<O, I> {
    /// Take ownership of the pins and drive the coil de-energised.
    pub fn new(coil: O, aux: I, polarity: ContactorPolarity) -> Self {
        let mut contactor = Self {
            coil,
            aux,
            polarity,
            intent: ContactorIntent::Open,
        };
        contactor.drive(false);
        contactor
    }

    pub fn set_polarity(&mut self, polarity: ContactorPolarity) {
        self.polarity = polarity;
    }

    pub fn open(&mut self) {
        if self.intent != ContactorIntent::Open {
            info!("Contactor: open");
        }
        self.drive(false);
        self.intent = ContactorIntent::Open;
    }

    pub fn close(&mut self) {
        if self.intent != ContactorIntent::Closed {
            info!("Contactor: close");
        }
        self.drive(true);
        self.intent = ContactorIntent::Closed;
    }

    /// Fresh sample of the auxiliary contact.
    pub fn read_feedback(&mut self) -> ContactorPhysical {
        match self.aux.is_high() {
            Ok(high) if high == self.polarity.feedback_closed_high => ContactorPhysical::Closed,
            Ok(_) => ContactorPhysical::Open,
            Err(e) => {
                warn!("Contactor feedback read failed: {:?}", e);
                ContactorPhysical::Unknown
            }
        }
    }

    pub fn intent(&self) -> ContactorIntent {
        self.intent
    }

    /// Display helper; says nothing about the physical contacts.
    pub fn is_commanded_closed(&self) -> bool {
        self.intent == ContactorIntent::Closed
    }

    fn drive(&mut self, energise: bool) {
        let high = energise == self.polarity.drive_active_high;
        let result = if high {
            self.coil.set_high()
        } else {
            self.coil.set_low()
        };
        if let Err(e) = result {
            error!("Contactor coil write failed (energise={}): {:?}", energise, e);
        }
    }
}
