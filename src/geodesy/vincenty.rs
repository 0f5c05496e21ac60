//! Vincenty's direct and inverse formulae on an ellipsoid of revolution.
//!
//! Angles are in radians, distances in meters. Both solvers iterate on the auxiliary
//! sphere until the correction drops below [`CONVERGENCE`].

use super::Ellipsoid;

const CONVERGENCE: f64 = 1e-12;
const MAX_ITERATIONS: usize = 200;

/// Destination of the direct problem.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Direct {
    pub lat: f64,
    pub lon: f64,
    pub azimuth2: f64,
}

/// Solution of the inverse problem.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Inverse {
    pub distance: f64,
    pub azimuth1: f64,
    pub azimuth2: f64,
    pub converged: bool,
}

/// Reduced latitude as (sin U, cos U).
fn reduced_latitude(ellps: &Ellipsoid, lat: f64) -> (f64, f64) {
    let tan_u = (1.0 - ellps.f) * lat.tan();
    let cos_u = 1.0 / (1.0 + tan_u * tan_u).sqrt();
    (tan_u * cos_u, cos_u)
}

/// Series coefficients A and B for a given u².
fn series_ab(u_sq: f64) -> (f64, f64) {
    let a = 1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
    let b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
    (a, b)
}

fn delta_sigma(b: f64, sin_sigma: f64, cos_sigma: f64, cos_2sigma_m: f64) -> f64 {
    let c2 = cos_2sigma_m * cos_2sigma_m;
    b * sin_sigma
        * (cos_2sigma_m
            + b / 4.0
                * (cos_sigma * (-1.0 + 2.0 * c2)
                    - b / 6.0
                        * cos_2sigma_m
                        * (-3.0 + 4.0 * sin_sigma * sin_sigma)
                        * (-3.0 + 4.0 * c2)))
}

pub fn direct(ellps: &Ellipsoid, lat1: f64, lon1: f64, azimuth1: f64, distance: f64) -> Direct {
    let f = ellps.f;
    let b = ellps.semi_minor_axis();

    let (sin_alpha1, cos_alpha1) = azimuth1.sin_cos();
    let (sin_u1, cos_u1) = reduced_latitude(ellps, lat1);

    let sigma1 = (sin_u1 / cos_u1).atan2(cos_alpha1);
    let sin_alpha = cos_u1 * sin_alpha1;
    let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
    let u_sq = cos_sq_alpha * ellps.second_eccentricity_sq();
    let (big_a, big_b) = series_ab(u_sq);

    let sigma0 = distance / (b * big_a);
    let mut sigma = sigma0;
    for _ in 0..MAX_ITERATIONS {
        let cos_2sigma_m = (2.0 * sigma1 + sigma).cos();
        let (sin_sigma, cos_sigma) = sigma.sin_cos();
        let next = sigma0 + delta_sigma(big_b, sin_sigma, cos_sigma, cos_2sigma_m);
        let done = (next - sigma).abs() < CONVERGENCE;
        sigma = next;
        if done {
            break;
        }
    }

    let cos_2sigma_m = (2.0 * sigma1 + sigma).cos();
    let (sin_sigma, cos_sigma) = sigma.sin_cos();

    let x = sin_u1 * sin_sigma - cos_u1 * cos_sigma * cos_alpha1;
    let lat2 = (sin_u1 * cos_sigma + cos_u1 * sin_sigma * cos_alpha1)
        .atan2((1.0 - f) * (sin_alpha * sin_alpha + x * x).sqrt());
    let lambda = (sin_sigma * sin_alpha1).atan2(cos_u1 * cos_sigma - sin_u1 * sin_sigma * cos_alpha1);
    let c = f / 16.0 * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha));
    let l = lambda
        - (1.0 - c)
            * f
            * sin_alpha
            * (sigma
                + c * sin_sigma
                    * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)));

    Direct {
        lat: lat2,
        lon: lon1 + l,
        azimuth2: sin_alpha.atan2(-x),
    }
}

pub fn inverse(ellps: &Ellipsoid, lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> Inverse {
    let f = ellps.f;
    let b = ellps.semi_minor_axis();

    let l = lon2 - lon1;
    let (sin_u1, cos_u1) = reduced_latitude(ellps, lat1);
    let (sin_u2, cos_u2) = reduced_latitude(ellps, lat2);

    let mut lambda = l;
    let mut converged = false;

    let mut sin_lambda;
    let mut cos_lambda;
    let mut sin_sigma = 0.0;
    let mut cos_sigma = 1.0;
    let mut sigma = 0.0;
    let mut cos_sq_alpha = 1.0;
    let mut cos_2sigma_m = 0.0;

    for _ in 0..MAX_ITERATIONS {
        (sin_lambda, cos_lambda) = lambda.sin_cos();
        let t1 = cos_u2 * sin_lambda;
        let t2 = cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda;
        let sin_sq_sigma = t1 * t1 + t2 * t2;
        if sin_sq_sigma == 0.0 {
            // coincident points
            return Inverse {
                distance: 0.0,
                azimuth1: 0.0,
                azimuth2: 0.0,
                converged: true,
            };
        }
        sin_sigma = sin_sq_sigma.sqrt();
        cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
        sigma = sin_sigma.atan2(cos_sigma);

        let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
        cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
        // equatorial line: cos²α = 0
        cos_2sigma_m = if cos_sq_alpha != 0.0 {
            cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
        } else {
            0.0
        };

        let c = f / 16.0 * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha));
        let previous = lambda;
        lambda = l
            + (1.0 - c)
                * f
                * sin_alpha
                * (sigma
                    + c * sin_sigma
                        * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)));

        if (lambda - previous).abs() < CONVERGENCE {
            converged = true;
            break;
        }
    }

    let u_sq = cos_sq_alpha * ellps.second_eccentricity_sq();
    let (big_a, big_b) = series_ab(u_sq);
    let distance = b * big_a * (sigma - delta_sigma(big_b, sin_sigma, cos_sigma, cos_2sigma_m));

    (sin_lambda, cos_lambda) = lambda.sin_cos();
    let azimuth1 = (cos_u2 * sin_lambda).atan2(cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda);
    let azimuth2 = (cos_u1 * sin_lambda).atan2(-sin_u1 * cos_u2 + cos_u1 * sin_u2 * cos_lambda);

    Inverse {
        distance,
        azimuth1,
        azimuth2,
        converged,
    }
}
