//! Builds the per-call aircraft map from tracked aircraft.

use std::collections::BTreeMap;

use log::debug;
use serde::Deserialize;

use crate::{
    clearance::aircraft::{AddressingForm, AircraftMap, AircraftState, SttAircraft},
    data::{AviationData, WeightClass},
};

/// An instrument approach available to an arrival.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApproachInfo {
    /// Approach code ("I22L").
    pub code: String,
    /// Full name used for telephony ("ILS Runway 22L").
    pub full_name: String,
    /// Fix identifiers on the approach.
    pub fixes: Vec<String>,
}

/// Simulator-side view of one aircraft on the controller's frequency.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TrackedAircraft {
    pub callsign: String,
    pub aircraft_type: String,
    pub weight_class: WeightClass,
    pub altitude: i32,
    pub state: AircraftState,
    pub fixes: Vec<String>,
    pub sid: String,
    pub star: String,
    pub approaches: Vec<ApproachInfo>,
    pub assigned_approach: String,
    pub lahso_runways: Vec<String>,
    pub controller_frequency: String,
    pub tracking_controller: String,
}

pub struct AircraftContextBuilder<'a> {
    data: &'a dyn AviationData,
    aircraft: AircraftMap,
}

impl<'a> AircraftContextBuilder<'a> {
    pub fn new(data: &'a dyn AviationData) -> Self {
        Self {
            data,
            aircraft: AircraftMap::new(),
        }
    }

    pub fn add(mut self, tracked: &TrackedAircraft) -> Self {
        let data = self.data;
        let fixes = tracked
            .fixes
            .iter()
            .map(|fix| (data.fix_telephony(fix), fix.clone()))
            .collect();

        let mut candidate_approaches = BTreeMap::new();
        let mut approach_fixes = BTreeMap::new();
        for approach in &tracked.approaches {
            candidate_approaches.insert(
                data.approach_telephony(&approach.full_name),
                approach.code.clone(),
            );
            let spoken_fixes: BTreeMap<_, _> = approach
                .fixes
                .iter()
                .filter(|fix| (3..=5).contains(&fix.len()) && !fix.starts_with('_'))
                .map(|fix| (data.fix_telephony(fix), fix.clone()))
                .collect();
            if !spoken_fixes.is_empty() {
                approach_fixes.insert(approach.code.clone(), spoken_fixes);
            }
        }

        let mut ac = SttAircraft {
            callsign: tracked.callsign.clone(),
            aircraft_type: tracked.aircraft_type.clone(),
            altitude: tracked.altitude,
            state: tracked.state,
            fixes,
            candidate_approaches,
            approach_fixes,
            assigned_approach: tracked.assigned_approach.clone(),
            sid: tracked.sid.clone(),
            star: tracked.star.clone(),
            controller_frequency: tracked.controller_frequency.clone(),
            tracking_controller: tracked.tracking_controller.clone(),
            addressing_form: AddressingForm::Full,
            lahso_runways: tracked.lahso_runways.clone(),
        };
        ac.merge_assigned_approach_fixes();

        let telephony = data.callsign_spoken(&tracked.callsign, tracked.weight_class);
        debug!("context: {telephony:?} -> {}", ac.callsign);

        if ac.is_ga() && !ac.aircraft_type.is_empty() {
            let trailing3 = data.trailing3_spoken(&ac.callsign);
            if !trailing3.is_empty() {
                let mut type_ac = ac.clone();
                type_ac.callsign.push_str("/T");
                type_ac.addressing_form = AddressingForm::TypeTrailing3;
                for type_spoken in data.ac_type_pronunciations(&ac.aircraft_type) {
                    if type_spoken.contains(|c: char| c.is_ascii_digit()) {
                        continue;
                    }
                    self.aircraft
                        .insert(format!("{type_spoken} {trailing3}"), type_ac.clone());
                }
            }
        }
        self.aircraft.insert(telephony, ac);
        self
    }

    pub fn build(self) -> AircraftMap {
        self.aircraft
    }
}

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use super::*;
    use crate::{clearance::airlines::Airlines, data::StaticAviationData};

    static DATA: LazyLock<StaticAviationData> = LazyLock::new(|| {
        StaticAviationData::new(&Airlines::load_airlines_from_file().unwrap())
            .with_fix_telephony("DPK", "deer park")
    });

    #[test]
    fn test_build_airline_context() {
        let tracked = TrackedAircraft {
            callsign: "DLH400".to_string(),
            weight_class: WeightClass::Heavy,
            altitude: 12000,
            state: AircraftState::Arrival,
            fixes: vec!["DPK".to_string()],
            approaches: vec![ApproachInfo {
                code: "I22L".to_string(),
                full_name: "ILS Runway 22L".to_string(),
                fixes: vec!["ZULAB".to_string(), "_INT".to_string()],
            }],
            assigned_approach: "I22L".to_string(),
            ..Default::default()
        };
        let map = AircraftContextBuilder::new(&*DATA).add(&tracked).build();
        let ac = &map["Lufthansa 400 heavy"];
        assert_eq!(ac.callsign, "DLH400");
        assert_eq!(ac.fixes["deer park"], "DPK");
        assert_eq!(ac.fixes["zulab"], "ZULAB");
        assert_eq!(ac.candidate_approaches["i l s runway two two left"], "I22L");
        assert!(!ac.approach_fixes["I22L"].contains_key("_int"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_build_ga_type_variants() {
        let tracked = TrackedAircraft {
            callsign: "N123AB".to_string(),
            aircraft_type: "C172".to_string(),
            state: AircraftState::VfrFlightFollowing,
            ..Default::default()
        };
        let map = AircraftContextBuilder::new(&*DATA).add(&tracked).build();
        assert_eq!(map.len(), 3);
        assert_eq!(map["November 123AB"].addressing_form, AddressingForm::Full);
        let typed = &map["skyhawk three alpha bravo"];
        assert_eq!(typed.callsign, "N123AB/T");
        assert_eq!(typed.addressing_form, AddressingForm::TypeTrailing3);
        assert!(map.contains_key("cessna three alpha bravo"));
    }
}
