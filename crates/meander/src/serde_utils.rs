//! Serde proxies for glam types.

use glam::DVec2;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Serde proxy for DVec2
#[derive(Serialize, Deserialize)]
pub struct DVec2Def {
    pub x: f64,
    pub y: f64,
}

impl From<DVec2> for DVec2Def {
    fn from(v: DVec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

impl From<DVec2Def> for DVec2 {
    fn from(def: DVec2Def) -> Self {
        DVec2::new(def.x, def.y)
    }
}

pub fn serialize_dvec2<S>(v: &DVec2, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    DVec2Def::from(*v).serialize(s)
}

pub fn deserialize_dvec2<'de, D>(d: D) -> Result<DVec2, D::Error>
where
    D: Deserializer<'de>,
{
    DVec2Def::deserialize(d).map(DVec2::from)
}
