//! Coordinate reference system canonicalization.
//!
//! Every dataset is normalized to EPSG:4326 (longitude/latitude) exactly
//! once, at ingestion. The municipal cadastre ships in SIRGAS 2000 / UTM
//! (southern hemisphere zones); a few web exports use Web Mercator. Those
//! are the only projected systems supported.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};
use std::fmt;
use std::str::FromStr;

use geo::{Coord, Geometry, MapCoords};

use crate::SpatialError;

/// GRS80 semi-major axis (meters).
const GRS80_A: f64 = 6_378_137.0;

/// GRS80 flattening.
const GRS80_F: f64 = 1.0 / 298.257_222_101;

/// UTM scale factor on the central meridian.
const UTM_K0: f64 = 0.9996;

const UTM_FALSE_EASTING: f64 = 500_000.0;

const UTM_FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Spherical Web Mercator radius.
const WEB_MERCATOR_R: f64 = 6_378_137.0;

/// First SIRGAS 2000 / UTM south EPSG code (zone 18S).
const SIRGAS_UTM_SOUTH_BASE: u32 = 31_960;

/// A supported coordinate reference system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Crs {
    /// EPSG:4326, the canonical system.
    Wgs84,
    /// EPSG:4674. Coincident with WGS 84 at dashboard accuracy.
    Sirgas2000,
    /// EPSG:3857.
    WebMercator,
    /// SIRGAS 2000 / UTM zone `N`S (EPSG:31978 through EPSG:31985).
    SirgasUtmSouth(u8),
}

impl Crs {
    /// The reference system all overlay comparisons happen in.
    pub const CANONICAL: Self = Self::Wgs84;

    /// Resolves an EPSG code.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::UnsupportedCrs`] for any code outside the
    /// supported set.
    pub fn from_epsg(code: u32) -> Result<Self, SpatialError> {
        match code {
            4326 => Ok(Self::Wgs84),
            4674 => Ok(Self::Sirgas2000),
            3857 | 900_913 => Ok(Self::WebMercator),
            31_978..=31_985 => {
                #[allow(clippy::cast_possible_truncation)]
                let zone = (code - SIRGAS_UTM_SOUTH_BASE) as u8;
                Ok(Self::SirgasUtmSouth(zone))
            }
            _ => Err(SpatialError::UnsupportedCrs {
                crs: format!("EPSG:{code}"),
            }),
        }
    }

    /// EPSG code of this system.
    #[must_use]
    pub fn epsg(self) -> u32 {
        match self {
            Self::Wgs84 => 4326,
            Self::Sirgas2000 => 4674,
            Self::WebMercator => 3857,
            Self::SirgasUtmSouth(zone) => SIRGAS_UTM_SOUTH_BASE + u32::from(zone),
        }
    }

    /// Whether coordinates are already longitude/latitude degrees.
    #[must_use]
    pub const fn is_geographic(self) -> bool {
        matches!(self, Self::Wgs84 | Self::Sirgas2000)
    }

    /// Converts a coordinate in this system to longitude/latitude.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::NonFiniteCoordinate`] if the input or the
    /// result is not finite, or [`SpatialError::OutOfDomain`] if a projected
    /// input lands outside the longitude/latitude range.
    pub fn to_lon_lat(self, coord: Coord<f64>) -> Result<Coord<f64>, SpatialError> {
        ensure_finite(coord)?;
        let out = match self {
            Self::Wgs84 | Self::Sirgas2000 => return Ok(coord),
            Self::WebMercator => web_mercator_inverse(coord),
            Self::SirgasUtmSouth(zone) => utm_south_inverse(coord, zone),
        };
        let out = ensure_finite(out)?;

        if out.x.abs() > 180.0 || out.y.abs() > 90.0 {
            return Err(SpatialError::OutOfDomain {
                crs: self.to_string(),
                x: coord.x,
                y: coord.y,
            });
        }

        Ok(out)
    }

    /// Converts a longitude/latitude coordinate into this system.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::NonFiniteCoordinate`] if the input or the
    /// result is not finite.
    pub fn from_lon_lat(self, coord: Coord<f64>) -> Result<Coord<f64>, SpatialError> {
        ensure_finite(coord)?;
        let out = match self {
            Self::Wgs84 | Self::Sirgas2000 => coord,
            Self::WebMercator => web_mercator_forward(coord),
            Self::SirgasUtmSouth(zone) => utm_south_forward(coord, zone),
        };
        ensure_finite(out)
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

impl FromStr for Crs {
    type Err = SpatialError;

    /// Accepts `EPSG:31982`, bare codes, OGC URNs
    /// (`urn:ogc:def:crs:EPSG::31982`) and `CRS84`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.to_ascii_uppercase().ends_with("CRS84") {
            return Ok(Self::Wgs84);
        }

        trimmed
            .rsplit(':')
            .next()
            .and_then(|code| code.trim().parse::<u32>().ok())
            .map_or_else(
                || {
                    Err(SpatialError::UnsupportedCrs {
                        crs: trimmed.to_string(),
                    })
                },
                Self::from_epsg,
            )
    }
}

/// Reprojects a geometry from `declared` into the canonical system.
///
/// An undeclared system is taken to be EPSG:4326 already.
///
/// # Errors
///
/// Returns [`SpatialError::NonFiniteCoordinate`] if any coordinate is not
/// finite before or after conversion, or [`SpatialError::OutOfDomain`] if a
/// projected coordinate falls outside the longitude/latitude range.
pub fn to_canonical(
    geometry: &Geometry<f64>,
    declared: Option<Crs>,
) -> Result<Geometry<f64>, SpatialError> {
    let crs = declared.unwrap_or(Crs::CANONICAL);
    geometry.try_map_coords(|coord| crs.to_lon_lat(coord))
}

const fn ensure_finite(coord: Coord<f64>) -> Result<Coord<f64>, SpatialError> {
    if coord.x.is_finite() && coord.y.is_finite() {
        Ok(coord)
    } else {
        Err(SpatialError::NonFiniteCoordinate {
            x: coord.x,
            y: coord.y,
        })
    }
}

fn web_mercator_inverse(coord: Coord<f64>) -> Coord<f64> {
    let lon = (coord.x / WEB_MERCATOR_R).to_degrees();
    let lat = 2.0f64
        .mul_add((coord.y / WEB_MERCATOR_R).exp().atan(), -FRAC_PI_2)
        .to_degrees();
    Coord { x: lon, y: lat }
}

fn web_mercator_forward(coord: Coord<f64>) -> Coord<f64> {
    let x = WEB_MERCATOR_R * coord.x.to_radians();
    let y = WEB_MERCATOR_R * (FRAC_PI_4 + coord.y.to_radians() / 2.0).tan().ln();
    Coord { x, y }
}

fn central_meridian(zone: u8) -> f64 {
    f64::from(zone).mul_add(6.0, -183.0)
}

const fn eccentricity_squared() -> f64 {
    GRS80_F * (2.0 - GRS80_F)
}

/// Meridian arc length from the equator to `phi` (radians).
fn meridian_arc(phi: f64) -> f64 {
    let e2 = eccentricity_squared();
    let e4 = e2 * e2;
    let e6 = e4 * e2;

    GRS80_A
        * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
            - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
}

#[allow(clippy::suboptimal_flops)]
fn utm_south_forward(coord: Coord<f64>, zone: u8) -> Coord<f64> {
    let e2 = eccentricity_squared();
    let ep2 = e2 / (1.0 - e2);

    let phi = coord.y.to_radians();
    let (sin_phi, cos_phi) = phi.sin_cos();
    let tan_phi = phi.tan();

    let n = GRS80_A / (1.0 - e2 * sin_phi * sin_phi).sqrt();
    let t = tan_phi * tan_phi;
    let c = ep2 * cos_phi * cos_phi;
    let a = (coord.x - central_meridian(zone)).to_radians() * cos_phi;
    let m = meridian_arc(phi);

    let x = UTM_K0
        * n
        * (a + (1.0 - t + c) * a.powi(3) / 6.0
            + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a.powi(5) / 120.0);
    let y = UTM_K0
        * (m + n
            * tan_phi
            * (a * a / 2.0
                + (5.0 - t + 9.0 * c + 4.0 * c * c) * a.powi(4) / 24.0
                + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a.powi(6) / 720.0));

    Coord {
        x: x + UTM_FALSE_EASTING,
        y: y + UTM_FALSE_NORTHING_SOUTH,
    }
}

#[allow(clippy::suboptimal_flops)]
fn utm_south_inverse(coord: Coord<f64>, zone: u8) -> Coord<f64> {
    let e2 = eccentricity_squared();
    let ep2 = e2 / (1.0 - e2);

    let x = coord.x - UTM_FALSE_EASTING;
    let y = coord.y - UTM_FALSE_NORTHING_SOUTH;

    let m = y / UTM_K0;
    let mu = m / (GRS80_A * (1.0 - e2 / 4.0 - 3.0 * e2 * e2 / 64.0 - 5.0 * e2.powi(3) / 256.0));

    let sqrt_1me2 = (1.0 - e2).sqrt();
    let e1 = (1.0 - sqrt_1me2) / (1.0 + sqrt_1me2);

    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

    let (sin_phi1, cos_phi1) = phi1.sin_cos();
    let tan_phi1 = phi1.tan();

    let c1 = ep2 * cos_phi1 * cos_phi1;
    let t1 = tan_phi1 * tan_phi1;
    let denom = 1.0 - e2 * sin_phi1 * sin_phi1;
    let n1 = GRS80_A / denom.sqrt();
    let r1 = GRS80_A * (1.0 - e2) / denom.powf(1.5);
    let d = x / (n1 * UTM_K0);

    let lat = phi1
        - (n1 * tan_phi1 / r1)
            * (d * d / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d.powi(4) / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * ep2 - 3.0 * c1 * c1)
                    * d.powi(6)
                    / 720.0);

    let lon = (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
        + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1) * d.powi(5)
            / 120.0)
        / cos_phi1;

    Coord {
        x: central_meridian(zone) + lon.to_degrees(),
        y: lat.to_degrees(),
    }
}
