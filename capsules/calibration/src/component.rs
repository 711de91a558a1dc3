// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Component for a calibration session.
//!
//! Usage
//! -----
//! ```rust,ignore
//! let calibrator = capsules_calibration::component::CalibratorComponent::new(
//!     channels,
//!     configuration,
//! )
//! .finalize(capsules_calibration::calibrator_component_static!(
//!     nrf52_calibration::Nrf52Channels<'static>
//! ));
//! ```

use core::mem::MaybeUninit;

use kernel::component::Component;

use crate::calibrator::{Calibrator, Configuration};
use crate::hil::ChannelRegistry;
use crate::log::ObservationLogger;

// Setup static space for the objects.
#[macro_export]
macro_rules! calibrator_component_static {
    ($R:ty $(,)?) => {{
        let calibrator = kernel::static_buf!($crate::calibrator::Calibrator<'static, $R>);
        let logger = kernel::static_buf!($crate::log::ObservationLogger);

        (calibrator, logger)
    }};
}

pub struct CalibratorComponent<R: 'static + ChannelRegistry<'static>> {
    registry: &'static R,
    configuration: Configuration<'static>,
}

impl<R: 'static + ChannelRegistry<'static>> CalibratorComponent<R> {
    pub fn new(registry: &'static R, configuration: Configuration<'static>) -> Self {
        Self {
            registry,
            configuration,
        }
    }
}

impl<R: 'static + ChannelRegistry<'static>> Component for CalibratorComponent<R> {
    type StaticInput = (
        &'static mut MaybeUninit<Calibrator<'static, R>>,
        &'static mut MaybeUninit<ObservationLogger>,
    );
    type Output = &'static Calibrator<'static, R>;

    fn finalize(self, static_memory: Self::StaticInput) -> Self::Output {
        let logger = static_memory.1.write(ObservationLogger::new());
        let calibrator = static_memory
            .0
            .write(Calibrator::new(self.registry, self.configuration));
        calibrator.set_client(logger);
        calibrator
    }
}
