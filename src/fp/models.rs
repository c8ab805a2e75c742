// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - -
//                                                                           -
//                       ****************************                        -
//                         ARITHMETIC CODING MODELS                          -
//                       ****************************                        -
//                                                                           -
// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - -
//                                                                           -
// Probability models for the floating-point arithmetic coding variant      -
// -> 64-bit floating-point variables, 16-bit renormalization               -
//                                                                           -
// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - -

use crate::errors::ArithmeticError;
use crate::models::{MAX_PROBABILITY, MIN_PROBABILITY};

// maximum bit count before counts are halved
pub(crate) const BM_MAX_COUNT: u32 = 1 << 14;
// maximum symbol count before counts are halved
pub(crate) const DM_MAX_COUNT: u32 = 1 << 17;

// largest alphabet the floating-point tables support
const MAX_DATA_SYMBOLS: u32 = 1 << 14;

fn validate_probability(p: f64) -> Result<(), ArithmeticError> {
    if p < MIN_PROBABILITY || p > MAX_PROBABILITY {
        Err(ArithmeticError::InvalidProbability(p))
    } else {
        Ok(())
    }
}

fn validate_data_symbols(symbols: u32) -> Result<(), ArithmeticError> {
    if symbols < 2 || symbols > MAX_DATA_SYMBOLS {
        Err(ArithmeticError::InvalidSymbolCount(symbols))
    } else {
        Ok(())
    }
}

/// Binary model with a fixed bit probability.
#[derive(Debug)]
pub struct StaticBitModel {
    pub(crate) bit_0_prob: f64,
}

impl StaticBitModel {
    pub fn new() -> Self {
        Self { bit_0_prob: 0.5 }
    }

    pub fn set_probability_0(&mut self, p0: f64) -> Result<(), ArithmeticError> {
        validate_probability(p0)?;
        self.bit_0_prob = p0;
        Ok(())
    }
}

impl Default for StaticBitModel {
    fn default() -> Self {
        Self::new()
    }
}

/// Binary model re-estimated from running counts.
#[derive(Debug)]
pub struct AdaptiveBitModel {
    pub(crate) bit_0_prob: f64,
    pub(crate) bit_0_count: u32,
    pub(crate) bit_count: u32,
    pub(crate) update_cycle: u32,
    pub(crate) bits_until_update: u32,
}

impl AdaptiveBitModel {
    pub fn new() -> Self {
        // initialization to equiprobable model
        Self {
            bit_0_prob: 0.5,
            bit_0_count: 1,
            bit_count: 2,
            // start with frequent updates
            update_cycle: 4,
            bits_until_update: 4,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub(crate) fn update(&mut self) {
        // halve counts when a threshold is reached
        self.bit_count += self.update_cycle;
        if self.bit_count >= BM_MAX_COUNT {
            self.bit_count = (self.bit_count + 1) >> 1;
            self.bit_0_count = (self.bit_0_count + 1) >> 1;
            if self.bit_0_count == self.bit_count {
                self.bit_count += 1;
            }
        }

        self.bit_0_prob = f64::from(self.bit_0_count) / f64::from(self.bit_count);

        // set frequency of model updates
        self.update_cycle = (5 * self.update_cycle) >> 2;
        if self.update_cycle > 64 {
            self.update_cycle = 64;
        }
        self.bits_until_update = self.update_cycle;
    }
}

impl Default for AdaptiveBitModel {
    fn default() -> Self {
        Self::new()
    }
}

/// N-ary model with a fixed cumulative distribution.
#[derive(Debug)]
pub struct StaticDataModel {
    pub(crate) data_symbols: u32,
    pub(crate) distribution: Vec<f64>,
}

impl StaticDataModel {
    pub fn new() -> Self {
        Self {
            data_symbols: 0,
            distribution: Vec::new(),
        }
    }

    /// Assigns the symbol probabilities; the alphabet size is the
    /// length of the slice.
    pub fn set_distribution(&mut self, probability: &[f64]) -> Result<(), ArithmeticError> {
        self.rebuild(probability.len() as u32, Some(probability))
    }

    /// Assigns a uniform distribution over `data_symbols` symbols.
    pub fn set_uniform(&mut self, data_symbols: u32) -> Result<(), ArithmeticError> {
        self.rebuild(data_symbols, None)
    }

    fn rebuild(&mut self, symbols: u32, probability: Option<&[f64]>) -> Result<(), ArithmeticError> {
        validate_data_symbols(symbols)?;

        let n = symbols as usize;
        self.data_symbols = symbols;
        self.distribution = vec![0.0; n];

        // compute cumulative distribution
        let uniform_p = 1.0 / f64::from(symbols);
        let mut sum = 0.0;
        for k in 0..n {
            let p = probability.map_or(uniform_p, |probability| probability[k]);
            validate_probability(p)?;
            self.distribution[k] = sum;
            sum += p;
        }
        if sum < 1.0 - MIN_PROBABILITY || sum > 1.0 + MIN_PROBABILITY {
            return Err(ArithmeticError::InvalidDistributionSum(sum));
        }
        Ok(())
    }
}

impl Default for StaticDataModel {
    fn default() -> Self {
        Self::new()
    }
}

/// N-ary model re-estimated from symbol counts.
#[derive(Debug)]
pub struct AdaptiveDataModel {
    pub(crate) data_symbols: u32,
    pub(crate) distribution: Vec<f64>,
    pub(crate) symbol_count: Vec<u32>,
    pub(crate) total_count: u32,
    pub(crate) update_cycle: u32,
    pub(crate) symbols_until_update: u32,
}

impl AdaptiveDataModel {
    pub fn new(data_symbols: u32) -> Result<Self, ArithmeticError> {
        let mut model = Self {
            data_symbols: 0,
            distribution: Vec::new(),
            symbol_count: Vec::new(),
            total_count: 0,
            update_cycle: 0,
            symbols_until_update: 0,
        };
        model.set_alphabet(data_symbols)?;
        Ok(model)
    }

    pub fn set_alphabet(&mut self, data_symbols: u32) -> Result<(), ArithmeticError> {
        validate_data_symbols(data_symbols)?;

        if self.data_symbols != data_symbols {
            let n = data_symbols as usize;
            self.data_symbols = data_symbols;
            self.distribution = vec![0.0; n];
            self.symbol_count = vec![0u32; n];
        }

        self.reset();
        Ok(())
    }

    /// Restores probability estimates to the uniform distribution.
    pub fn reset(&mut self) {
        if self.data_symbols == 0 {
            return;
        }

        self.total_count = 0;
        self.update_cycle = self.data_symbols;
        for count in &mut self.symbol_count {
            *count = 1;
        }
        self.update();
        self.update_cycle = (self.data_symbols + 6) >> 1;
        self.symbols_until_update = self.update_cycle;
    }

    pub(crate) fn update(&mut self) {
        // halve counts when a threshold is reached
        self.total_count += self.update_cycle;
        if self.total_count > DM_MAX_COUNT {
            self.total_count = 0;
            for count in &mut self.symbol_count {
                *count = (*count + 1) >> 1;
                self.total_count += *count;
            }
        }

        // compute cumulative distribution
        let mut sum = 0u32;
        let scale = 1.0 / f64::from(self.total_count);
        for (distribution, count) in self.distribution.iter_mut().zip(&self.symbol_count) {
            *distribution = scale * f64::from(sum);
            sum += *count;
        }

        // set frequency of model updates
        self.update_cycle = (5 * self.update_cycle) >> 2;
        let max_cycle = (self.data_symbols + 6) << 3;
        if self.update_cycle > max_cycle {
            self.update_cycle = max_cycle;
        }
        self.symbols_until_update = self.update_cycle;
    }
}
