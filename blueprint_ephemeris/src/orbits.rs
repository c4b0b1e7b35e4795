//! Keplerian orbits with the principal periodic corrections.
//!
//! Elements are osculating values of date, expressed as linear functions of
//! the day number `d` counted from 1999-12-31 0h UT.

use crate::calc::{normalize_degrees, Body, BodyResult, EARTH_RADIUS_AU};

const DAY_ZERO: f64 = 2_451_543.5;

/// Degrees of general precession per day, for J2000-referenced series.
pub(crate) const PRECESSION_PER_DAY: f64 = 3.823_94e-5;

pub(crate) fn day_number(jd: f64) -> f64 {
    jd - DAY_ZERO
}

#[derive(Debug, Clone, Copy)]
struct Elements {
    /// Longitude of the ascending node.
    node: f64,
    inclination: f64,
    /// Argument of perihelion.
    perihelion: f64,
    semi_major_axis: f64,
    eccentricity: f64,
    mean_anomaly: f64,
}

fn elements(body: Body, d: f64) -> Elements {
    match body {
        Body::Sun => Elements {
            node: 0.0,
            inclination: 0.0,
            perihelion: 282.9404 + 4.70935e-5 * d,
            semi_major_axis: 1.0,
            eccentricity: 0.016709 - 1.151e-9 * d,
            mean_anomaly: 356.0470 + 0.985_600_258_5 * d,
        },
        Body::Moon => Elements {
            node: 125.1228 - 0.052_953_808_3 * d,
            inclination: 5.1454,
            perihelion: 318.0634 + 0.164_357_322_3 * d,
            semi_major_axis: 60.2666,
            eccentricity: 0.054900,
            mean_anomaly: 115.3654 + 13.064_992_950_9 * d,
        },
        Body::Mercury => Elements {
            node: 48.3313 + 3.24587e-5 * d,
            inclination: 7.0047 + 5.00e-8 * d,
            perihelion: 29.1241 + 1.01444e-5 * d,
            semi_major_axis: 0.387098,
            eccentricity: 0.205635 + 5.59e-10 * d,
            mean_anomaly: 168.6562 + 4.092_334_436_8 * d,
        },
        Body::Venus => Elements {
            node: 76.6799 + 2.46590e-5 * d,
            inclination: 3.3946 + 2.75e-8 * d,
            perihelion: 54.8910 + 1.38374e-5 * d,
            semi_major_axis: 0.723330,
            eccentricity: 0.006773 - 1.302e-9 * d,
            mean_anomaly: 48.0052 + 1.602_130_224_4 * d,
        },
        Body::Mars => Elements {
            node: 49.5574 + 2.11081e-5 * d,
            inclination: 1.8497 - 1.78e-8 * d,
            perihelion: 286.5016 + 2.92961e-5 * d,
            semi_major_axis: 1.523688,
            eccentricity: 0.093405 + 2.516e-9 * d,
            mean_anomaly: 18.6021 + 0.524_020_776_6 * d,
        },
        Body::Jupiter => Elements {
            node: 100.4542 + 2.76854e-5 * d,
            inclination: 1.3030 - 1.557e-7 * d,
            perihelion: 273.8777 + 1.64505e-5 * d,
            semi_major_axis: 5.20256,
            eccentricity: 0.048498 + 4.469e-9 * d,
            mean_anomaly: 19.8950 + 0.083_085_300_1 * d,
        },
        Body::Saturn => Elements {
            node: 113.6634 + 2.38980e-5 * d,
            inclination: 2.4886 - 1.081e-7 * d,
            perihelion: 339.3939 + 2.97661e-5 * d,
            semi_major_axis: 9.55475,
            eccentricity: 0.055546 - 9.499e-9 * d,
            mean_anomaly: 316.9670 + 0.033_444_228_2 * d,
        },
        Body::Uranus => Elements {
            node: 74.0005 + 1.3978e-5 * d,
            inclination: 0.7733 + 1.9e-8 * d,
            perihelion: 96.6612 + 3.0565e-5 * d,
            semi_major_axis: 19.18171 - 1.55e-8 * d,
            eccentricity: 0.047318 + 7.45e-9 * d,
            mean_anomaly: 142.5905 + 0.011_725_806 * d,
        },
        Body::Neptune => Elements {
            node: 131.7806 + 3.0173e-5 * d,
            inclination: 1.7700 - 2.55e-7 * d,
            perihelion: 272.8461 - 6.027e-6 * d,
            semi_major_axis: 30.05826 + 3.313e-8 * d,
            eccentricity: 0.008606 + 2.15e-9 * d,
            mean_anomaly: 260.2471 + 0.005_995_147 * d,
        },
        // Pluto, the node and Chiron are not modelled with these elements
        Body::Pluto | Body::TrueNode | Body::Chiron => Elements {
            node: 0.0,
            inclination: 0.0,
            perihelion: 0.0,
            semi_major_axis: 0.0,
            eccentricity: 0.0,
            mean_anomaly: 0.0,
        },
    }
}

fn sin_d(deg: f64) -> f64 {
    deg.to_radians().sin()
}

fn cos_d(deg: f64) -> f64 {
    deg.to_radians().cos()
}

/// Solves Kepler's equation `M = E - e sin E` for E, all in degrees.
pub(crate) fn eccentric_anomaly(mean_anomaly: f64, eccentricity: f64) -> f64 {
    let m = normalize_degrees(mean_anomaly).to_radians();
    let mut e_anomaly = m + eccentricity * m.sin() * (1.0 + eccentricity * m.cos());
    for _ in 0..50 {
        let delta = (e_anomaly - eccentricity * e_anomaly.sin() - m)
            / (1.0 - eccentricity * e_anomaly.cos());
        e_anomaly -= delta;
        if delta.abs() < 1e-10 {
            break;
        }
    }
    e_anomaly.to_degrees()
}

/// Heliocentric ecliptic rectangular coordinates for a set of elements.
fn heliocentric(el: &Elements) -> (f64, f64, f64) {
    let e_anomaly = eccentric_anomaly(el.mean_anomaly, el.eccentricity);
    let xv = el.semi_major_axis * (cos_d(e_anomaly) - el.eccentricity);
    let yv = el.semi_major_axis
        * (1.0 - el.eccentricity * el.eccentricity).sqrt()
        * sin_d(e_anomaly);
    let true_anomaly = yv.atan2(xv).to_degrees();
    let r = (xv * xv + yv * yv).sqrt();

    let u = true_anomaly + el.perihelion;
    let xh = r * (cos_d(el.node) * cos_d(u) - sin_d(el.node) * sin_d(u) * cos_d(el.inclination));
    let yh = r * (sin_d(el.node) * cos_d(u) + cos_d(el.node) * sin_d(u) * cos_d(el.inclination));
    let zh = r * (sin_d(u) * sin_d(el.inclination));
    (xh, yh, zh)
}

fn spherical(x: f64, y: f64, z: f64) -> (f64, f64, f64) {
    let lon = normalize_degrees(y.atan2(x).to_degrees());
    let lat = z.atan2((x * x + y * y).sqrt()).to_degrees();
    let r = (x * x + y * y + z * z).sqrt();
    (lon, lat, r)
}

fn rectangular(lon: f64, lat: f64, r: f64) -> (f64, f64, f64) {
    (
        r * cos_d(lon) * cos_d(lat),
        r * sin_d(lon) * cos_d(lat),
        r * sin_d(lat),
    )
}

/// Geocentric rectangular coordinates of the Sun, which are also the
/// Earth-to-heliocentric offset for every other body.
pub(crate) fn sun_rectangular(d: f64) -> (f64, f64) {
    let sun = sun(d);
    let (x, y, _) = rectangular(sun.longitude, 0.0, sun.distance);
    (x, y)
}

pub(crate) fn sun(d: f64) -> BodyResult {
    let el = elements(Body::Sun, d);
    let e_anomaly = eccentric_anomaly(el.mean_anomaly, el.eccentricity);
    let xv = cos_d(e_anomaly) - el.eccentricity;
    let yv = (1.0 - el.eccentricity * el.eccentricity).sqrt() * sin_d(e_anomaly);
    let true_anomaly = yv.atan2(xv).to_degrees();
    BodyResult {
        longitude: normalize_degrees(true_anomaly + el.perihelion),
        latitude: 0.0,
        distance: (xv * xv + yv * yv).sqrt(),
    }
}

pub(crate) fn moon(d: f64) -> BodyResult {
    let el = elements(Body::Moon, d);
    let (x, y, z) = heliocentric(&el);
    let (lon, lat, r) = spherical(x, y, z);

    let sun_el = elements(Body::Sun, d);
    let ms = sun_el.mean_anomaly;
    let mm = el.mean_anomaly;
    let ls = ms + sun_el.perihelion;
    let lm = mm + el.perihelion + el.node;
    let elong = lm - ls;
    let f = lm - el.node;

    let lon_correction = -1.274 * sin_d(mm - 2.0 * elong)
        + 0.658 * sin_d(2.0 * elong)
        - 0.186 * sin_d(ms)
        - 0.059 * sin_d(2.0 * mm - 2.0 * elong)
        - 0.057 * sin_d(mm - 2.0 * elong + ms)
        + 0.053 * sin_d(mm + 2.0 * elong)
        + 0.046 * sin_d(2.0 * elong - ms)
        + 0.041 * sin_d(mm - ms)
        - 0.035 * sin_d(elong)
        - 0.031 * sin_d(mm + ms)
        - 0.015 * sin_d(2.0 * f - 2.0 * elong)
        + 0.011 * sin_d(mm - 4.0 * elong);

    let lat_correction = -0.173 * sin_d(f - 2.0 * elong)
        - 0.055 * sin_d(mm - f - 2.0 * elong)
        - 0.046 * sin_d(mm + f - 2.0 * elong)
        + 0.033 * sin_d(f + 2.0 * elong)
        + 0.017 * sin_d(2.0 * mm + f);

    let distance_correction = -0.58 * cos_d(mm - 2.0 * elong) - 0.46 * cos_d(2.0 * elong);

    BodyResult {
        longitude: normalize_degrees(lon + lon_correction),
        latitude: lat + lat_correction,
        distance: (r + distance_correction) * EARTH_RADIUS_AU,
    }
}

/// Mercury through Neptune.
pub(crate) fn planet(d: f64, body: Body) -> BodyResult {
    let el = elements(body, d);
    let (xh, yh, zh) = heliocentric(&el);
    let (mut lon, mut lat, r) = spherical(xh, yh, zh);

    let mj = elements(Body::Jupiter, d).mean_anomaly;
    let ms = elements(Body::Saturn, d).mean_anomaly;
    let mu = elements(Body::Uranus, d).mean_anomaly;

    match body {
        Body::Jupiter => {
            lon += -0.332 * sin_d(2.0 * mj - 5.0 * ms - 67.6)
                - 0.056 * sin_d(2.0 * mj - 2.0 * ms + 21.0)
                + 0.042 * sin_d(3.0 * mj - 5.0 * ms + 21.0)
                - 0.036 * sin_d(mj - 2.0 * ms)
                + 0.022 * cos_d(mj - ms)
                + 0.023 * sin_d(2.0 * mj - 3.0 * ms + 52.0)
                - 0.016 * sin_d(mj - 5.0 * ms - 69.0);
        }
        Body::Saturn => {
            lon += 0.812 * sin_d(2.0 * mj - 5.0 * ms - 67.6)
                - 0.229 * cos_d(2.0 * mj - 4.0 * ms - 2.0)
                + 0.119 * sin_d(mj - 2.0 * ms - 3.0)
                + 0.046 * sin_d(2.0 * mj - 6.0 * ms - 69.0)
                + 0.014 * sin_d(mj - 3.0 * ms + 32.0);
            lat += -0.020 * cos_d(2.0 * mj - 4.0 * ms - 2.0)
                + 0.018 * sin_d(2.0 * mj - 6.0 * ms - 49.0);
        }
        Body::Uranus => {
            lon += 0.040 * sin_d(ms - 2.0 * mu + 6.0)
                + 0.035 * sin_d(ms - 3.0 * mu + 33.0)
                - 0.015 * sin_d(mj - mu + 20.0);
        }
        _ => {}
    }

    geocentric(d, lon, lat, r)
}

/// Pluto from a periodic series, referenced to J2000 and precessed to date.
pub(crate) fn pluto(d: f64) -> BodyResult {
    let s = 50.03 + 0.033_459_652 * d;
    let p = 238.95 + 0.003_968_789 * d;

    let lon = 238.9508 + 0.004_007_03 * d - 19.799 * sin_d(p) + 19.848 * cos_d(p)
        + 0.897 * sin_d(2.0 * p)
        - 4.956 * cos_d(2.0 * p)
        + 0.610 * sin_d(3.0 * p)
        + 1.211 * cos_d(3.0 * p)
        - 0.341 * sin_d(4.0 * p)
        - 0.190 * cos_d(4.0 * p)
        + 0.128 * sin_d(5.0 * p)
        - 0.034 * cos_d(5.0 * p)
        - 0.038 * sin_d(6.0 * p)
        + 0.031 * cos_d(6.0 * p)
        + 0.020 * sin_d(s - p)
        - 0.010 * cos_d(s - p);

    let lat = -3.9082 - 5.453 * sin_d(p) - 14.975 * cos_d(p) + 3.527 * sin_d(2.0 * p)
        + 1.673 * cos_d(2.0 * p)
        - 1.051 * sin_d(3.0 * p)
        + 0.328 * cos_d(3.0 * p)
        + 0.179 * sin_d(4.0 * p)
        - 0.292 * cos_d(4.0 * p)
        + 0.019 * sin_d(5.0 * p)
        + 0.100 * cos_d(5.0 * p)
        - 0.031 * sin_d(6.0 * p)
        - 0.026 * cos_d(6.0 * p)
        + 0.011 * cos_d(s - p);

    let r = 40.72 + 6.68 * sin_d(p) + 6.90 * cos_d(p) - 1.18 * sin_d(2.0 * p)
        - 0.03 * cos_d(2.0 * p)
        + 0.15 * sin_d(3.0 * p)
        - 0.14 * cos_d(3.0 * p);

    geocentric(d, lon + PRECESSION_PER_DAY * d, lat, r)
}

/// Shifts heliocentric spherical coordinates to the geocentre.
pub(crate) fn geocentric(d: f64, lon: f64, lat: f64, r: f64) -> BodyResult {
    let (xh, yh, zh) = rectangular(lon, lat, r);
    let (xs, ys) = sun_rectangular(d);
    let (longitude, latitude, distance) = spherical(xh + xs, yh + ys, zh);
    BodyResult {
        longitude,
        latitude,
        distance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_kepler_circular_orbit() {
        assert_relative_eq!(eccentric_anomaly(123.0, 0.0), 123.0, epsilon = 1e-9);
    }

    #[test]
    fn test_kepler_satisfies_equation() {
        let e = 0.37955;
        let e_anomaly = eccentric_anomaly(29.3, e);
        let m = e_anomaly.to_radians() - e * e_anomaly.to_radians().sin();
        assert_relative_eq!(m.to_degrees(), 29.3, epsilon = 1e-7);
    }

    #[test]
    fn test_day_number_epoch() {
        // 2000 January 0.0 UT
        assert_relative_eq!(day_number(2_451_543.5), 0.0);
    }

    #[test]
    fn test_pluto_plausible_distance() {
        let result = pluto(0.0);
        assert!(result.distance > 28.0 && result.distance < 50.0);
    }
}
