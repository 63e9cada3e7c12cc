//! Diagnostic algorithm selection from the environment.
//!
//! Production entry points ([`reduce`](crate::reduce::reduce) and the
//! [`stats`](crate::stats) functions) always sum pairwise and never look
//! at the environment. Validation and benchmark harnesses that want to
//! compare strategies build a [`DiagnosticConfig`] instead, which honors
//! `U_REDUCE_ALGORITHM`:
//!
//! ```text
//! U_REDUCE_ALGORITHM=kahan cargo bench
//! ```

use std::env::{self, VarError};

use log::{debug, warn};

use crate::reduce::{reduce_with, sum_mean_with, Reduction, Request};
use crate::sequence::Sequence;
use crate::summation::{Algorithm, ParseAlgorithmError};

/// Environment variable naming a diagnostic [`Algorithm`].
pub const ALGORITHM_ENV: &str = "U_REDUCE_ALGORITHM";

/// Why the diagnostic selector could not be read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("U_REDUCE_ALGORITHM: {0}")]
    UnknownAlgorithm(#[from] ParseAlgorithmError),
    #[error("U_REDUCE_ALGORITHM is not valid unicode")]
    NotUnicode,
}

impl Algorithm {
    /// Reads [`ALGORITHM_ENV`].
    ///
    /// # Returns
    /// - `Ok(None)` if the variable is unset or blank.
    /// - `Err` if it is set to something that names no algorithm.
    pub fn from_env() -> Result<Option<Algorithm>, ConfigError> {
        parse_env_value(env::var(ALGORITHM_ENV))
    }
}

fn parse_env_value(value: Result<String, VarError>) -> Result<Option<Algorithm>, ConfigError> {
    match value {
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(_)) => Err(ConfigError::NotUnicode),
        Ok(s) if s.trim().is_empty() => Ok(None),
        Ok(s) => Ok(Some(s.parse()?)),
    }
}

/// Strategy choice for validation and benchmark runs.
///
/// # Examples
/// ```
/// use u_reduce::config::DiagnosticConfig;
/// use u_reduce::reduce::Request;
/// use u_reduce::summation::Algorithm;
///
/// let config = DiagnosticConfig::new(Algorithm::Kahan);
/// let r = config.reduce(&[1.0, 2.0, 3.0, 4.0, 5.0], Request::all());
/// assert_eq!(r.variance, Some(2.5));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiagnosticConfig {
    pub algorithm: Algorithm,
}

impl DiagnosticConfig {
    /// Uses `algorithm` regardless of the environment.
    pub fn new(algorithm: Algorithm) -> Self {
        Self { algorithm }
    }

    /// Reads [`ALGORITHM_ENV`], falling back to pairwise (with a warning)
    /// if the variable cannot be used.
    pub fn from_env() -> Self {
        Self::from_env_value(env::var(ALGORITHM_ENV))
    }

    fn from_env_value(value: Result<String, VarError>) -> Self {
        match parse_env_value(value) {
            Ok(Some(algorithm)) => {
                debug!("diagnostic summation algorithm: {algorithm}");
                Self { algorithm }
            }
            Ok(None) => Self::default(),
            Err(e) => {
                warn!("{e}; using {}", Algorithm::Pairwise);
                Self::default()
            }
        }
    }

    /// [`reduce`](crate::reduce::reduce) with the configured strategy.
    pub fn reduce<S: Sequence + ?Sized>(&self, x: &S, request: Request) -> Reduction {
        reduce_with(x, request, self.algorithm)
    }

    /// Sum and mean with the configured strategy.
    pub fn sum_mean<S: Sequence + ?Sized>(&self, x: &S) -> (f64, Option<f64>) {
        sum_mean_with(x, self.algorithm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reduce::reduce;
    use std::ffi::OsString;

    #[test]
    fn test_unset_is_none() {
        assert_eq!(parse_env_value(Err(VarError::NotPresent)), Ok(None));
        assert_eq!(parse_env_value(Ok("  ".to_string())), Ok(None));
    }

    #[test]
    fn test_named_algorithm() {
        assert_eq!(
            parse_env_value(Ok("two-loop".to_string())),
            Ok(Some(Algorithm::TwoLoop))
        );
        assert_eq!(
            parse_env_value(Ok("Naive_Extended".to_string())),
            Ok(Some(Algorithm::NaiveExtended))
        );
    }

    #[test]
    fn test_unknown_algorithm() {
        let err = parse_env_value(Ok("51".to_string())).unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnknownAlgorithm(ParseAlgorithmError("51".to_string()))
        );
        assert!(err.to_string().starts_with("U_REDUCE_ALGORITHM: unknown summation algorithm"));
    }

    #[test]
    fn test_not_unicode() {
        let err = parse_env_value(Err(VarError::NotUnicode(OsString::new()))).unwrap_err();
        assert_eq!(err, ConfigError::NotUnicode);
    }

    #[test]
    fn test_config_falls_back_to_pairwise() {
        let config = DiagnosticConfig::from_env_value(Ok("bogus".to_string()));
        assert_eq!(config.algorithm, Algorithm::Pairwise);
        let config = DiagnosticConfig::from_env_value(Err(VarError::NotPresent));
        assert_eq!(config.algorithm, Algorithm::Pairwise);
        let config = DiagnosticConfig::from_env_value(Ok("kahan".to_string()));
        assert_eq!(config.algorithm, Algorithm::Kahan);
    }

    #[test]
    fn test_config_reduce_uses_selected_algorithm() {
        let mut data = vec![1.0];
        data.extend(std::iter::repeat(1e-16).take(1000));

        let naive = DiagnosticConfig::new(Algorithm::NaiveStandard);
        let (sum, _) = naive.sum_mean(&data);
        assert_eq!(sum, 1.0);

        let pairwise = DiagnosticConfig::default();
        let (sum, _) = pairwise.sum_mean(&data);
        assert!(sum > 1.0);
        assert_eq!(
            pairwise.reduce(&data, Request::all()),
            reduce(&data, Request::all())
        );
    }
}
