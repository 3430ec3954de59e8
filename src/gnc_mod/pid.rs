// ---------------------------------------------------------------------------
// PID Controller (single scalar, timestamped samples, conditional integration)
// ---------------------------------------------------------------------------

/// Stateful PID filter driven by absolute timestamps rather than a fixed step.
///
/// The integral only accumulates while doing so does not push an already
/// saturated PD output further into its rail.
#[derive(Debug, Clone)]
pub struct Pid {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub out_min: f64,
    pub out_max: f64,
    last_error: f64,
    integral: f64,
    derivative: f64,
    last_time: Option<f64>,
    last_output: f64,
}

impl Pid {
    /// Gains plus output bounds. `out_min > out_max` is a caller error and is
    /// not checked.
    pub fn new(kp: f64, ki: f64, kd: f64, out_min: f64, out_max: f64) -> Self {
        Self {
            kp,
            ki,
            kd,
            out_min,
            out_max,
            last_error: 0.0,
            integral: 0.0,
            derivative: 0.0,
            last_time: None,
            last_output: 0.0,
        }
    }

    /// Feed one sample and return the bounded command.
    ///
    /// `time` must not decrease between calls; a non-positive step returns the
    /// previous output untouched.
    pub fn seek(&mut self, setpoint: f64, measurement: f64, time: f64) -> f64 {
        let error = setpoint - measurement;

        let Some(last_time) = self.last_time else {
            // no valid dt yet: proportional term only
            let output = self.clamp(self.kp * error);
            self.store(error, time, output);
            return output;
        };

        let dt = time - last_time;
        if dt <= 0.0 {
            return self.last_output;
        }

        self.derivative = (error - self.last_error) / dt;
        let pd = self.kp * error + self.kd * self.derivative;

        let may_fall = self.integral >= 0.0 || pd > self.out_min;
        let may_rise = self.integral <= 0.0 || pd < self.out_max;
        if may_fall && may_rise {
            self.integral += error * dt;
        }

        let output = self.clamp(pd + self.ki * self.integral);
        self.store(error, time, output);
        output
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }

    pub fn derivative(&self) -> f64 {
        self.derivative
    }

    pub fn last_output(&self) -> f64 {
        self.last_output
    }

    pub fn reset(&mut self) {
        self.last_error = 0.0;
        self.integral = 0.0;
        self.derivative = 0.0;
        self.last_time = None;
        self.last_output = 0.0;
    }

    fn clamp(&self, value: f64) -> f64 {
        value.max(self.out_min).min(self.out_max)
    }

    fn store(&mut self, error: f64, time: f64, output: f64) {
        self.last_error = error;
        self.last_time = Some(time);
        self.last_output = output;
    }
}
