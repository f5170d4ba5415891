use nalgebra::{DMatrix, DVector};

use crate::{ConvexError, ConvexFunction, Result, check_dims};

/// `c + b·x`
#[derive(Clone, Debug, PartialEq)]
pub struct LinearFunction {
    b: DVector<f64>,
    c: f64,
}

impl LinearFunction {
    pub fn new(b: DVector<f64>, c: f64) -> Result<Self> {
        if b.is_empty() {
            return Err(ConvexError::invalid("dimension must be nonzero"));
        }
        Ok(Self { b, c })
    }

    pub fn from_slice(b: &[f64], c: f64) -> Result<Self> {
        Self::new(DVector::from_column_slice(b), c)
    }
}

impl ConvexFunction for LinearFunction {
    fn dims(&self) -> usize {
        self.b.len()
    }

    fn value(&self, x: &DVector<f64>) -> Result<f64> {
        check_dims(self.dims(), x)?;
        Ok(self.c + self.b.dot(x))
    }

    fn gradient(&self, x: &DVector<f64>) -> Result<DVector<f64>> {
        check_dims(self.dims(), x)?;
        Ok(self.b.clone())
    }

    fn hessian(&self, x: &DVector<f64>) -> Result<DMatrix<f64>> {
        let n = self.dims();
        check_dims(n, x)?;
        Ok(DMatrix::zeros(n, n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::dvector;

    #[test]
    fn evaluates_affine_value() {
        let f = LinearFunction::from_slice(&[1.0, -2.0], 3.0).unwrap();
        let x = dvector![4.0, 1.0];

        assert_eq!(f.value(&x).unwrap(), 5.0);
        assert_eq!(f.gradient(&x).unwrap(), dvector![1.0, -2.0]);
        assert_eq!(f.hessian(&x).unwrap(), DMatrix::zeros(2, 2));
    }

    #[test]
    fn rejects_empty_coefficients() {
        assert!(matches!(
            LinearFunction::from_slice(&[], 1.0),
            Err(ConvexError::InvalidArgument(_))
        ));
    }

    #[test]
    fn rejects_wrong_length_point() {
        let f = LinearFunction::from_slice(&[1.0, 1.0], 0.0).unwrap();
        assert_eq!(
            f.value(&dvector![1.0, 2.0, 3.0]),
            Err(ConvexError::DimensionMismatch {
                expected: 2,
                found: 3
            })
        );
    }
}
