//! Scratch buffers shared by every adapter call
//!
//! Three regions of two f64 each, laid out the way the provider ABI expects:
//! `[re, im]` contiguous. Allocated once per adapter and reused.

use crate::complex::Complex;

/// One complex number in provider layout
pub type ComplexBuf = [f64; 2];

#[derive(Debug, Default)]
pub struct ScratchPool {
    lhs: ComplexBuf,
    rhs: ComplexBuf,
    out: ComplexBuf,
}

fn store(buf: &mut ComplexBuf, z: Complex) {
    buf[0] = z.re;
    buf[1] = z.im;
}

fn load(buf: &ComplexBuf) -> Complex {
    Complex::new(buf[0], buf[1])
}

impl ScratchPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write both operands, run `call` against the buffers, read the result
    pub fn binary<E>(
        &mut self,
        a: Complex,
        b: Complex,
        call: impl FnOnce(&ComplexBuf, &ComplexBuf, &mut ComplexBuf) -> Result<(), E>,
    ) -> Result<Complex, E> {
        store(&mut self.lhs, a);
        store(&mut self.rhs, b);
        call(&self.lhs, &self.rhs, &mut self.out)?;
        Ok(load(&self.out))
    }

    /// Write one operand and hand it to a call that returns a scalar
    pub fn unary<T, E>(
        &mut self,
        z: Complex,
        call: impl FnOnce(&ComplexBuf) -> Result<T, E>,
    ) -> Result<T, E> {
        store(&mut self.lhs, z);
        call(&self.lhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_reads_back_out_buffer() {
        let mut pool = ScratchPool::new();
        let result: Result<Complex, ()> = pool.binary(
            Complex::new(1.0, 2.0),
            Complex::new(3.0, 4.0),
            |lhs, rhs, out| {
                out[0] = lhs[0] + rhs[0];
                out[1] = lhs[1] * rhs[1];
                Ok(())
            },
        );
        assert_eq!(result, Ok(Complex::new(4.0, 8.0)));
    }

    #[test]
    fn test_binary_propagates_call_error() {
        let mut pool = ScratchPool::new();
        let result = pool.binary(Complex::new(1.0, 0.0), Complex::new(0.0, 1.0), |_, _, _| {
            Err("boom")
        });
        assert_eq!(result, Err("boom"));
    }

    #[test]
    fn test_unary_sees_operand() {
        let mut pool = ScratchPool::new();
        let seen: Result<ComplexBuf, ()> = pool.unary(Complex::new(-1.5, 0.5), |z| Ok(*z));
        assert_eq!(seen, Ok([-1.5, 0.5]));
    }
}
