//! Small fixed table of coordinate reference systems, used for reporting only.

use serde::Serialize;

/// EPSG code type alias
pub type EpsgCode = u16;

/// WGS84 Geographic 2D (EPSG:4326)
pub const EPSG_WGS84_GEOGRAPHIC_2D: EpsgCode = 4326;
/// WGS84 Geographic 3D (EPSG:4979)
pub const EPSG_WGS84_GEOGRAPHIC_3D: EpsgCode = 4979;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinearUnit {
    Degree,
    Metre,
    UsSurveyFoot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CrsInfo {
    pub epsg: EpsgCode,
    pub name: &'static str,
    pub unit: LinearUnit,
}

static CRS_TABLE: &[CrsInfo] = &[
    CrsInfo {
        epsg: EPSG_WGS84_GEOGRAPHIC_2D,
        name: "WGS 84",
        unit: LinearUnit::Degree,
    },
    CrsInfo {
        epsg: EPSG_WGS84_GEOGRAPHIC_3D,
        name: "WGS 84 (3D)",
        unit: LinearUnit::Degree,
    },
    CrsInfo {
        epsg: 3857,
        name: "WGS 84 / Pseudo-Mercator",
        unit: LinearUnit::Metre,
    },
    CrsInfo {
        epsg: 4269,
        name: "NAD83",
        unit: LinearUnit::Degree,
    },
    CrsInfo {
        epsg: 6697,
        name: "JGD2011",
        unit: LinearUnit::Degree,
    },
    CrsInfo {
        epsg: 6677,
        name: "JGD2011 / Japan Plane Rectangular CS IX",
        unit: LinearUnit::Metre,
    },
    CrsInfo {
        epsg: 26910,
        name: "NAD83 / UTM zone 10N",
        unit: LinearUnit::Metre,
    },
    CrsInfo {
        epsg: 32633,
        name: "WGS 84 / UTM zone 33N",
        unit: LinearUnit::Metre,
    },
    CrsInfo {
        epsg: 2193,
        name: "NZGD2000 / New Zealand Transverse Mercator 2000",
        unit: LinearUnit::Metre,
    },
    CrsInfo {
        epsg: 2927,
        name: "NAD83(HARN) / Washington South (ftUS)",
        unit: LinearUnit::UsSurveyFoot,
    },
];

pub fn lookup(epsg: EpsgCode) -> Option<&'static CrsInfo> {
    CRS_TABLE.iter().find(|info| info.epsg == epsg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_resolve() {
        let info = lookup(EPSG_WGS84_GEOGRAPHIC_3D).unwrap();
        assert_eq!(info.unit, LinearUnit::Degree);
        assert_eq!(lookup(32633).unwrap().unit, LinearUnit::Metre);
    }

    #[test]
    fn unknown_code_is_none() {
        assert!(lookup(1).is_none());
    }
}
