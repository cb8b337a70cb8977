//! The random source used by every move.
//!
//! The generator is passed explicitly to each trial, never kept in
//! global state, so a seeded run is reproducible and a resumed run
//! continues exactly where it stopped.

use rand::distributions::Uniform;
use rand::Rng;
use rand_core::RngCore;
use rand_distr::{Distribution, UnitSphere};
use vector3d::Vector3d;

/// Our random number generator.
pub type MyRng = rand_xoshiro::Xoshiro256StarStar;

/// A uniform random number in `[0, 1)`.
pub fn uniform01<R: RngCore + ?Sized>(rng: &mut R) -> f64 {
    rng.gen::<f64>()
}

/// A uniform random integer in `[0, n)`.
pub fn uniform_int<R: RngCore + ?Sized>(rng: &mut R, n: usize) -> usize {
    rng.sample(Uniform::new(0, n))
}

/// A uniform random number in `[a, b)`.
pub fn uniform_in<R: RngCore + ?Sized>(rng: &mut R, a: f64, b: f64) -> f64 {
    a + (b - a) * rng.gen::<f64>()
}

/// A random unit vector, uniformly distributed on the sphere.
pub fn vector<R: RngCore + ?Sized>(rng: &mut R) -> Vector3d<f64> {
    let [x, y, z]: [f64; 3] = UnitSphere.sample(rng);
    Vector3d::new(x, y, z)
}

#[cfg(test)]
use rand::SeedableRng;

#[test]
fn random_vectors_are_unit() {
    let mut rng = MyRng::seed_from_u64(7);
    for _ in 0..1000 {
        let v = vector(&mut rng);
        assert!((v.norm2() - 1.0).abs() < 1e-12);
    }
}

#[test]
fn random_vectors_are_not_biased() {
    let mut rng = MyRng::seed_from_u64(11);
    let mut total = Vector3d::new(0.0, 0.0, 0.0);
    let n = 100000;
    for _ in 0..n {
        total = total + vector(&mut rng);
    }
    let mean = total * (1.0 / n as f64);
    println!("mean of random unit vectors: {}", mean);
    assert!(mean.norm2().sqrt() < 0.02);
}

#[test]
fn uniform_int_stays_in_range() {
    let mut rng = MyRng::seed_from_u64(3);
    let mut seen = [false; 5];
    for _ in 0..1000 {
        let i = uniform_int(&mut rng, 5);
        assert!(i < 5);
        seen[i] = true;
    }
    assert!(seen.iter().all(|&s| s));
}

#[test]
fn seeded_generators_agree() {
    let mut a = MyRng::seed_from_u64(42);
    let mut b = a.clone();
    for _ in 0..16 {
        assert_eq!(uniform01(&mut a), uniform01(&mut b));
    }
}
