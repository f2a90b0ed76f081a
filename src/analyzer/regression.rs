use crate::model::{AnalysisError, ModelCapability};

/// A model mapping one numeric feature to a numeric target.
pub trait TrendModel: Send {
    fn fit(&mut self, x: &[f64], y: &[f64]) -> Result<(), AnalysisError>;
    fn predict(&self, x: &[f64]) -> Result<Vec<f64>, AnalysisError>;
    /// `(slope, intercept)` once fitted.
    fn params(&self) -> Option<(f64, f64)>;
}

/// Single-feature ordinary least squares.
#[derive(Debug, Default, Clone)]
pub struct LinearRegression {
    params: Option<(f64, f64)>,
}

impl TrendModel for LinearRegression {
    fn fit(&mut self, x: &[f64], y: &[f64]) -> Result<(), AnalysisError> {
        if x.len() != y.len() {
            return Err(AnalysisError::Fit(format!(
                "feature/target length mismatch: {} vs {}",
                x.len(),
                y.len()
            )));
        }
        if x.len() < 2 {
            return Err(AnalysisError::Fit(format!(
                "need at least 2 training samples, got {}",
                x.len()
            )));
        }

        let n = x.len() as f64;
        let mean_x = x.iter().sum::<f64>() / n;
        let mean_y = y.iter().sum::<f64>() / n;
        // Centered sums keep precision with large day ordinals.
        let sxy: f64 = x.iter().zip(y).map(|(xi, yi)| (xi - mean_x) * (yi - mean_y)).sum();
        let sxx: f64 = x.iter().map(|xi| (xi - mean_x).powi(2)).sum();

        if sxx == 0.0 {
            return Err(AnalysisError::Fit("training feature has zero variance".into()));
        }

        let slope = sxy / sxx;
        let intercept = mean_y - slope * mean_x;
        if !slope.is_finite() || !intercept.is_finite() {
            return Err(AnalysisError::Fit("non-finite regression parameters".into()));
        }

        self.params = Some((slope, intercept));
        Ok(())
    }

    fn predict(&self, x: &[f64]) -> Result<Vec<f64>, AnalysisError> {
        let (slope, intercept) = self
            .params
            .ok_or_else(|| AnalysisError::Fit("model has not been fitted".into()))?;
        Ok(x.iter().map(|xi| slope * xi + intercept).collect())
    }

    fn params(&self) -> Option<(f64, f64)> {
        self.params
    }
}

/// Instantiates a fresh model for the capability, or reports that it has no implementation.
pub fn build_model(capability: ModelCapability) -> Result<Box<dyn TrendModel>, AnalysisError> {
    match capability {
        ModelCapability::LinearRegression => Ok(Box::new(LinearRegression::default())),
        other => Err(AnalysisError::CapabilityUnavailable(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_exact_line() {
        let mut model = LinearRegression::default();
        let x = [738_886.0, 738_887.0, 738_888.0, 738_890.0];
        let y: Vec<f64> = x.iter().map(|v| 3.0 * v - 2_000_000.0).collect();
        model.fit(&x, &y).unwrap();

        let (slope, _) = model.params().unwrap();
        assert!((slope - 3.0).abs() < 1e-9);
        let pred = model.predict(&[738_889.0]).unwrap();
        assert!((pred[0] - (3.0 * 738_889.0 - 2_000_000.0)).abs() < 1e-6);
    }

    #[test]
    fn too_few_samples_is_fit_error() {
        let mut model = LinearRegression::default();
        assert!(matches!(model.fit(&[1.0], &[2.0]), Err(AnalysisError::Fit(_))));
        assert!(model.params().is_none());
        assert!(model.predict(&[1.0]).is_err());
    }

    #[test]
    fn constant_feature_is_fit_error() {
        let mut model = LinearRegression::default();
        assert!(matches!(
            model.fit(&[5.0, 5.0, 5.0], &[1.0, 2.0, 3.0]),
            Err(AnalysisError::Fit(_))
        ));
    }

    #[test]
    fn placeholder_capabilities_are_explicit() {
        assert!(build_model(ModelCapability::LinearRegression).is_ok());
        for cap in [ModelCapability::TimeSeriesForecast, ModelCapability::CustomerSegmentation] {
            assert!(!cap.is_implemented());
            assert_eq!(build_model(cap).err(), Some(AnalysisError::CapabilityUnavailable(cap)));
        }
    }
}
