const COULOMB_CONSTANT: f64 = 332.0637; // In kcal·Å/(mol·e²)
const MIN_DISTANCE: f64 = 1e-6;
const OVERLAP_ENERGY: f64 = 1e10;

// Every potential returns (energy, dE/dx) where x is its scalar argument.

#[inline]
pub fn harmonic(value: f64, equilibrium: f64, force_constant: f64) -> (f64, f64) {
    let delta = value - equilibrium;
    (force_constant * delta * delta, 2.0 * force_constant * delta)
}

#[inline]
pub fn lennard_jones_12_6(dist: f64, r_min: f64, well_depth: f64) -> (f64, f64) {
    if dist < MIN_DISTANCE {
        return (OVERLAP_ENERGY, 0.0);
    }
    let rho = r_min / dist;
    let rho6 = rho.powi(6);
    let rho12 = rho6 * rho6;
    let energy = well_depth * (rho12 - 2.0 * rho6);
    let derivative = -12.0 * well_depth * (rho12 - rho6) / dist;
    (energy, derivative)
}

/// Coulomb energy of a pair; `charge_product` is q1*q2 in e².
#[inline]
pub fn coulomb(dist: f64, charge_product: f64, dielectric: f64) -> (f64, f64) {
    if dist < MIN_DISTANCE {
        return (charge_product.signum() * OVERLAP_ENERGY, 0.0);
    }
    let energy = COULOMB_CONSTANT * charge_product / (dielectric * dist);
    (energy, -energy / dist)
}

/// Attractive Gaussian overlap `-weight * exp(-alpha * r^2)`.
#[inline]
pub fn gaussian_overlap(dist: f64, weight: f64, alpha: f64) -> (f64, f64) {
    let energy = -weight * (-alpha * dist * dist).exp();
    (energy, -2.0 * alpha * dist * energy)
}

/// Three-term Fourier torsion `0.5 * (V1(1 + cos φ) + V2(1 - cos 2φ) + V3(1 + cos 3φ))`.
#[inline]
pub fn fourier_torsion(phi: f64, v1: f64, v2: f64, v3: f64) -> (f64, f64) {
    let energy = 0.5
        * (v1 * (1.0 + phi.cos()) + v2 * (1.0 - (2.0 * phi).cos()) + v3 * (1.0 + (3.0 * phi).cos()));
    let derivative =
        0.5 * (-v1 * phi.sin() + 2.0 * v2 * (2.0 * phi).sin() - 3.0 * v3 * (3.0 * phi).sin());
    (energy, derivative)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn numeric_derivative<F: Fn(f64) -> f64>(x: f64, f: F) -> f64 {
        let h = 1e-6;
        (f(x + h) - f(x - h)) / (2.0 * h)
    }

    #[test]
    fn harmonic_is_zero_at_equilibrium() {
        assert_eq!(harmonic(1.5, 1.5, 300.0), (0.0, 0.0));
    }

    #[test]
    fn harmonic_energy_and_derivative_are_quadratic() {
        let (energy, derivative) = harmonic(2.0, 1.5, 10.0);
        assert!(f64_approx_equal(energy, 2.5));
        assert!(f64_approx_equal(derivative, 10.0));
    }

    #[test]
    fn lennard_jones_at_minimum_distance_returns_negative_well_depth() {
        let (energy, derivative) = lennard_jones_12_6(2.0, 2.0, 10.0);
        assert!(f64_approx_equal(energy, -10.0));
        assert!(f64_approx_equal(derivative, 0.0));
    }

    #[test]
    fn lennard_jones_at_very_small_distance_returns_large_positive_energy() {
        let (energy, derivative) = lennard_jones_12_6(1e-7, 2.0, 10.0);
        assert!(f64_approx_equal(energy, 1e10));
        assert_eq!(derivative, 0.0);
    }

    #[test]
    fn lennard_jones_derivative_matches_finite_difference() {
        let analytic = lennard_jones_12_6(3.1, 3.5, 0.2).1;
        let numeric = numeric_derivative(3.1, |d| lennard_jones_12_6(d, 3.5, 0.2).0);
        assert!((analytic - numeric).abs() < 1e-6);
    }

    #[test]
    fn coulomb_calculates_repulsive_energy_correctly() {
        let (energy, derivative) = coulomb(1.0, 1.0, 1.0);
        assert!(f64_approx_equal(energy, COULOMB_CONSTANT));
        assert!(f64_approx_equal(derivative, -COULOMB_CONSTANT));
    }

    #[test]
    fn coulomb_calculates_attractive_energy_correctly() {
        let (energy, _) = coulomb(2.0, -1.0, 1.0);
        assert!(f64_approx_equal(energy, -COULOMB_CONSTANT / 2.0));
    }

    #[test]
    fn coulomb_at_very_small_distance_returns_large_energy_with_correct_sign() {
        assert!(f64_approx_equal(coulomb(1e-7, 1.0, 1.0).0, 1e10));
        assert!(f64_approx_equal(coulomb(1e-7, -1.0, 1.0).0, -1e10));
    }

    #[test]
    fn gaussian_overlap_is_most_negative_at_contact() {
        let (energy, derivative) = gaussian_overlap(0.0, 2.0, 0.8);
        assert!(f64_approx_equal(energy, -2.0));
        assert_eq!(derivative, 0.0);
        assert!(gaussian_overlap(1.0, 2.0, 0.8).0 > energy);
    }

    #[test]
    fn gaussian_overlap_derivative_matches_finite_difference() {
        let analytic = gaussian_overlap(0.7, 1.5, 1.2).1;
        let numeric = numeric_derivative(0.7, |d| gaussian_overlap(d, 1.5, 1.2).0);
        assert!((analytic - numeric).abs() < 1e-6);
    }

    #[test]
    fn fourier_torsion_of_eclipsed_v3_barrier_is_maximal() {
        let (energy, derivative) = fourier_torsion(0.0, 0.0, 0.0, 2.0);
        assert!(f64_approx_equal(energy, 2.0));
        assert!(f64_approx_equal(derivative, 0.0));
    }

    #[test]
    fn fourier_torsion_derivative_matches_finite_difference() {
        let analytic = fourier_torsion(0.9, 1.3, 0.7, 2.1).1;
        let numeric = numeric_derivative(0.9, |phi| fourier_torsion(phi, 1.3, 0.7, 2.1).0);
        assert!((analytic - numeric).abs() < 1e-6);
    }
}
