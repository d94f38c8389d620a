use cstr_core::constraint::{ConstraintError, NonNegative, StrictlyPositive};
use uom::si::{
    f64::ThermodynamicTemperature, thermodynamic_temperature::kelvin,
    volume_rate::cubic_meter_per_second,
};

use crate::{ConfigurationError, ModelParameters};

/// Exogenous inputs in effect at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExogenousInputs {
    /// Feed temperature in kelvin.
    pub feed_temperature: f64,

    /// Coolant volumetric flow through the jacket in m³/s.
    pub coolant_flow: f64,
}

/// A single step change in the feed temperature and coolant flow.
///
/// Up to and including `switch_time` the nominal inputs from
/// [`ModelParameters`] apply. After it, the feed arrives at
/// `feed_temperature` and the coolant flow is scaled by `coolant_flow_factor`.
///
/// The disturbed feed temperature is always positive and the flow factor is
/// never negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisturbanceSchedule {
    switch_time: f64,
    feed_temperature: f64,
    coolant_flow_factor: f64,
}

impl DisturbanceSchedule {
    /// Feed temperature after the reference disturbance, in kelvin.
    pub const REFERENCE_FEED_TEMPERATURE: f64 = 298.0;

    /// Coolant flow multiplier after the reference disturbance.
    pub const REFERENCE_COOLANT_FLOW_FACTOR: f64 = 1.5;

    /// Creates a schedule that switches after `switch_time` seconds.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if the switch time is NaN, the
    /// disturbed feed temperature is not positive, or the flow factor is
    /// negative.
    pub fn new(
        switch_time: f64,
        feed_temperature: ThermodynamicTemperature,
        coolant_flow_factor: f64,
    ) -> Result<Self, ConfigurationError> {
        if switch_time.is_nan() {
            return Err(ConfigurationError::parameter(
                "switch_time",
                ConstraintError::NotANumber,
            ));
        }

        Ok(Self {
            switch_time,
            feed_temperature: StrictlyPositive::new(feed_temperature.get::<kelvin>())
                .map_err(|err| ConfigurationError::parameter("disturbed_feed_temperature", err))?
                .into_inner(),
            coolant_flow_factor: NonNegative::new(coolant_flow_factor)
                .map_err(|err| ConfigurationError::parameter("coolant_flow_factor", err))?
                .into_inner(),
        })
    }

    /// Returns the reference disturbance, switching halfway through the horizon.
    #[must_use]
    pub fn at_midpoint(start_time: f64, end_time: f64) -> Self {
        Self::reference_after(start_time + 0.5 * (end_time - start_time))
    }

    /// Returns a schedule that never leaves the nominal inputs.
    #[must_use]
    pub fn none() -> Self {
        Self::reference_after(f64::INFINITY)
    }

    fn reference_after(switch_time: f64) -> Self {
        Self {
            switch_time,
            feed_temperature: Self::REFERENCE_FEED_TEMPERATURE,
            coolant_flow_factor: Self::REFERENCE_COOLANT_FLOW_FACTOR,
        }
    }

    #[must_use]
    pub fn switch_time(&self) -> f64 {
        self.switch_time
    }

    #[must_use]
    pub fn feed_temperature(&self) -> ThermodynamicTemperature {
        ThermodynamicTemperature::new::<kelvin>(self.feed_temperature)
    }

    #[must_use]
    pub fn coolant_flow_factor(&self) -> f64 {
        self.coolant_flow_factor
    }

    /// Returns the exogenous inputs in effect at `time`.
    #[must_use]
    pub fn inputs_at(&self, parameters: &ModelParameters, time: f64) -> ExogenousInputs {
        let nominal_flow = parameters
            .coolant_flow()
            .get::<cubic_meter_per_second>();

        if time <= self.switch_time {
            ExogenousInputs {
                feed_temperature: parameters.feed_temperature().get::<kelvin>(),
                coolant_flow: nominal_flow,
            }
        } else {
            ExogenousInputs {
                feed_temperature: self.feed_temperature,
                coolant_flow: nominal_flow * self.coolant_flow_factor,
            }
        }
    }
}
