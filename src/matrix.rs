use blas::{zcopy, zdotu, zgemm};
use lapack::{zgesvd, zgetrf, zgetri};
use num::complex::Complex;
use std::fmt;
use std::ops::{Index, IndexMut};

use crate::errors::VmcError;

type C64 = Complex<f64>;

const ZERO: C64 = Complex { re: 0.0, im: 0.0 };
const ONE: C64 = Complex { re: 1.0, im: 0.0 };

/// Dense complex matrix stored column-major, as LAPACK expects it.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexMatrix {
    n_rows: usize,
    n_cols: usize,
    data: Vec<C64>,
}

impl ComplexMatrix {
    pub fn zeros(n_rows: usize, n_cols: usize) -> Self {
        ComplexMatrix { n_rows, n_cols, data: vec![ZERO; n_rows * n_cols] }
    }

    pub fn identity(n: usize) -> Self {
        let mut out = Self::zeros(n, n);
        for i in 0..n {
            out[(i, i)] = ONE;
        }
        out
    }

    pub fn from_fn<F>(n_rows: usize, n_cols: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> C64,
    {
        let mut data = Vec::with_capacity(n_rows * n_cols);
        for j in 0..n_cols {
            for i in 0..n_rows {
                data.push(f(i, j));
            }
        }
        ComplexMatrix { n_rows, n_cols, data }
    }

    #[inline(always)]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    #[inline(always)]
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn as_slice(&self) -> &[C64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [C64] {
        &mut self.data
    }

    #[inline(always)]
    pub fn column(&self, j: usize) -> &[C64] {
        &self.data[j * self.n_rows..(j + 1) * self.n_rows]
    }

    #[inline(always)]
    pub fn column_mut(&mut self, j: usize) -> &mut [C64] {
        let n = self.n_rows;
        &mut self.data[j * n..(j + 1) * n]
    }

    pub fn row(&self, i: usize) -> Vec<C64> {
        (0..self.n_cols).map(|j| self[(i, j)]).collect()
    }

    pub fn set_row(&mut self, i: usize, values: &[C64]) {
        assert_eq!(values.len(), self.n_cols);
        if self.n_cols == 0 {
            return;
        }
        let incx = 1;
        let incy = self.n_rows as i32;
        unsafe {
            zcopy(self.n_cols as i32, values, incx, &mut self.data[i..], incy);
        }
    }

    pub fn set_column(&mut self, j: usize, values: &[C64]) {
        self.column_mut(j).copy_from_slice(values);
    }

    /// Product of a row vector with column `j`, without conjugation.
    #[inline(always)]
    pub fn dot_column(&self, x: &[C64], j: usize) -> C64 {
        let mut pres = vec![ZERO; 1];
        unsafe {
            zdotu(&mut pres, self.n_rows as i32, x, 1, self.column(j), 1);
        }
        pres[0]
    }

    /// Product of row `i` with a column vector, without conjugation.
    #[inline(always)]
    pub fn dot_row(&self, i: usize, x: &[C64]) -> C64 {
        let mut pres = vec![ZERO; 1];
        unsafe {
            zdotu(&mut pres, self.n_cols as i32, &self.data[i..], self.n_rows as i32, x, 1);
        }
        pres[0]
    }

    /// Matrix product $AB$ through `zgemm`.
    pub fn matmul(&self, other: &ComplexMatrix) -> ComplexMatrix {
        assert_eq!(self.n_cols, other.n_rows);
        let mut out = ComplexMatrix::zeros(self.n_rows, other.n_cols);
        if self.n_rows == 0 || other.n_cols == 0 || self.n_cols == 0 {
            return out;
        }
        let transa = b"N"[0];
        let transb = b"N"[0];
        let m = self.n_rows as i32;
        let n = other.n_cols as i32;
        let k = self.n_cols as i32;
        unsafe {
            zgemm(transa, transb, m, n, k, ONE, &self.data, m, &other.data, k, ZERO, &mut out.data, m);
        }
        out
    }

    /// Largest entry of $|A-I|$.
    pub fn identity_deviation(&self) -> f64 {
        let mut max = 0.0f64;
        for j in 0..self.n_cols {
            for i in 0..self.n_rows {
                let target = if i == j { ONE } else { ZERO };
                max = max.max((self[(i, j)] - target).norm());
            }
        }
        max
    }

    /// Largest entry of $|A-B|$.
    pub fn max_abs_diff(&self, other: &ComplexMatrix) -> f64 {
        self.data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| (a - b).norm())
            .fold(0.0, f64::max)
    }

    fn lu(&self) -> Result<(Vec<C64>, Vec<i32>, i32), VmcError> {
        assert_eq!(self.n_rows, self.n_cols);
        let n = self.n_rows as i32;
        let mut a = self.data.clone();
        let mut ipiv = vec![0; self.n_rows];
        let mut info = 0;
        unsafe {
            zgetrf(n, n, &mut a, n, &mut ipiv, &mut info);
        }
        if info < 0 {
            return Err(VmcError::Lapack { routine: "zgetrf", info });
        }
        Ok((a, ipiv, info))
    }

    /// Inverse through `zgetrf` and `zgetri`, with a workspace query.
    pub fn inverse(&self) -> Result<ComplexMatrix, VmcError> {
        let n = self.n_rows as i32;
        if n == 0 {
            return Ok(self.clone());
        }
        let (mut a, ipiv, info) = self.lu()?;
        if info > 0 {
            return Err(VmcError::Lapack { routine: "zgetrf", info });
        }
        let mut info = 0;
        let mut work = vec![ZERO; 1];
        unsafe {
            zgetri(n, &mut a, n, &ipiv, &mut work, -1, &mut info);
        }
        let lwork = (work[0].re as i32).max(n);
        let mut work = vec![ZERO; lwork as usize];
        unsafe {
            zgetri(n, &mut a, n, &ipiv, &mut work, lwork, &mut info);
        }
        if info != 0 {
            return Err(VmcError::Lapack { routine: "zgetri", info });
        }
        Ok(ComplexMatrix { n_rows: self.n_rows, n_cols: self.n_cols, data: a })
    }

    /// Determinant from the LU factorisation. An exactly singular matrix
    /// gives zero.
    pub fn determinant(&self) -> Result<C64, VmcError> {
        if self.n_rows == 0 {
            return Ok(ONE);
        }
        let (a, ipiv, info) = self.lu()?;
        if info > 0 {
            return Ok(ZERO);
        }
        let n = self.n_rows;
        let mut det = ONE;
        for i in 0..n {
            det *= a[i + i * n];
            if ipiv[i] != (i + 1) as i32 {
                det = -det;
            }
        }
        Ok(det)
    }

    /// Reciprocal condition number $s_{\text{min}}/s_{\text{max}}$ from the
    /// singular values. The empty matrix is perfectly conditioned.
    pub fn reciprocal_condition(&self) -> Result<f64, VmcError> {
        let m = self.n_rows as i32;
        let n = self.n_cols as i32;
        let k = self.n_rows.min(self.n_cols);
        if k == 0 {
            return Ok(1.0);
        }
        let jobu = b"N"[0];
        let jobvt = b"N"[0];
        let mut a = self.data.clone();
        let mut s = vec![0.0; k];
        // Not referenced
        let mut u = vec![ZERO; 1];
        let mut vt = vec![ZERO; 1];
        let mut rwork = vec![0.0; 5 * k];
        let mut info = 0;
        let mut work = vec![ZERO; 1];
        unsafe {
            zgesvd(jobu, jobvt, m, n, &mut a, m, &mut s, &mut u, 1, &mut vt, 1, &mut work, -1, &mut rwork, &mut info);
        }
        let lwork = (work[0].re as i32).max(1);
        let mut work = vec![ZERO; lwork as usize];
        unsafe {
            zgesvd(jobu, jobvt, m, n, &mut a, m, &mut s, &mut u, 1, &mut vt, 1, &mut work, lwork, &mut rwork, &mut info);
        }
        if info != 0 {
            return Err(VmcError::Lapack { routine: "zgesvd", info });
        }
        // Singular values come sorted in decreasing order.
        let rcond = s[k - 1] / s[0];
        if rcond.is_nan() {
            return Ok(0.0);
        }
        Ok(rcond)
    }
}

impl Index<(usize, usize)> for ComplexMatrix {
    type Output = C64;

    #[inline(always)]
    fn index(&self, (i, j): (usize, usize)) -> &C64 {
        &self.data[i + j * self.n_rows]
    }
}

impl IndexMut<(usize, usize)> for ComplexMatrix {
    #[inline(always)]
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut C64 {
        &mut self.data[i + j * self.n_rows]
    }
}

impl fmt::Display for ComplexMatrix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for i in 0..self.n_rows {
            for j in 0..self.n_cols {
                let z = self[(i, j)];
                write!(f, "{:+.4}{:+.4}i ", z.re, z.im)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
