use num_traits::Float;

/// Default approach rate, per second
pub const DEFAULT_RATE: f64 = 12.0;

/// Exponential approach of `value` toward `goal` after `dt` seconds.
///
/// The remaining distance shrinks by `e^(-rate * dt)`, so the result always
/// lies between `value` and `goal`.
pub fn approach<T: Float>(value: T, goal: T, rate: T, dt: T) -> T {
    if dt <= T::zero() {
        return value;
    }
    let remaining = (-(rate * dt)).exp();
    goal + (value - goal) * remaining
}

/// A scalar easing toward a goal, advanced explicitly each frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Smoothed<T> {
    value: T,
    goal: T,
    rate: T,
}

impl<T: Float> Default for Smoothed<T> {
    fn default() -> Self {
        Self::new(T::zero())
    }
}

impl<T: Float> Smoothed<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            goal: value,
            rate: T::from(DEFAULT_RATE).unwrap_or_else(T::one),
        }
    }

    pub fn with_rate(mut self, rate: T) -> Self {
        self.rate = rate;
        self
    }

    pub fn value(&self) -> T {
        self.value
    }

    pub fn goal(&self) -> T {
        self.goal
    }

    pub fn rate(&self) -> T {
        self.rate
    }

    pub fn set_goal(&mut self, goal: T) {
        self.goal = goal;
    }

    pub fn set_rate(&mut self, rate: T) {
        self.rate = rate;
    }

    /// Jumps to `value` and stays there
    pub fn set_immediate(&mut self, value: T) {
        self.value = value;
        self.goal = value;
    }

    pub fn update(&mut self, dt: T) {
        self.value = approach(self.value, self.goal, self.rate, dt);
    }
}
