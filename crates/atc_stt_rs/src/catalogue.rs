//! The built-in command catalogue.
//!
//! Templates compete at every position: the highest priority full match
//! wins, ties go to the one that consumed more tokens. An empty output marks
//! an informational phrase that is recognized and dropped.

use crate::template::CommandTemplate;

fn t(name: &str, template: &str, output: &str) -> CommandTemplate {
    CommandTemplate::new(name, template, output)
}

pub fn default_templates() -> Vec<CommandTemplate> {
    [altitude(), heading(), speed(), navigation(), approach(), transponder(), handoff(), misc()]
        .into_iter()
        .flatten()
        .collect()
}

fn altitude() -> Vec<CommandTemplate> {
    vec![
        t("descend_maintain", "descend|descended|descending [and] maintain {altitude_fl}", "D{0}")
            .priority(10)
            .then_variant("TD{0}")
            .say_again_on_fail(),
        t("descend", "descend|descended|descending [and] [to] {altitude_fl}", "D{0}")
            .then_variant("TD{0}"),
        t("climb_maintain", "climb|climbed|climbing [and] maintain {altitude_fl}", "C{0}")
            .priority(10)
            .then_variant("TC{0}")
            .say_again_on_fail(),
        t("climb", "climb|climbed|climbing [and] [to] {altitude_fl}", "C{0}").then_variant("TC{0}"),
        t("maintain_altitude", "maintain [at] {altitude}", "A{0}").priority(3),
        // "decelerating three thousand": keyword lost, "thousand" heard
        t("standalone_altitude", "{standalone_altitude}", "A{0}").priority(1),
        t("expedite_descent", "expedite descent|descend|your", "ED").priority(10),
        t("expedite_climb", "expedite climb|your", "EC").priority(10),
        t("climb_via_sid", "climb via [the] {sid}", "CVS").priority(15),
        t("climb_via_sid_generic", "climb via sid", "CVS").priority(14),
        t("descend_via_star", "descend via [the] {star}", "DVS").priority(15),
        t("descend_via_star_generic", "descend via star", "DVS").priority(16),
        t("descend_via_arrival", "descend via [the] arrival", "DVS").priority(16),
        // "to sin via the boo seven arrival"
        t("descend_via_star_implicit", "via [the] {star} arrival", "DVS").priority(14),
        t("say_altitude", "say altitude", "SA").priority(10),
    ]
}

fn heading() -> Vec<CommandTemplate> {
    vec![
        t("turn_left_heading", "[turn] [to] left heading {heading}", "L{0:03}")
            .priority(10)
            .say_again_on_fail(),
        t("turn_right_heading", "[turn] [to] right heading {heading}", "R{0:03}")
            .priority(10)
            .say_again_on_fail(),
        t("turn_left_only", "[turn] [to] left {heading}", "L{0:03}").priority(7),
        t("turn_right_only", "[turn] [to] right {heading}", "R{0:03}").priority(7),
        t("fly_heading", "fly heading {heading}", "H{0:03}")
            .priority(9)
            .say_again_on_fail(),
        t("heading_only", "heading {heading}", "H{0:03}").say_again_on_fail(),
        t("present_heading", "[fly] present heading", "H").priority(12),
        t("turn_degrees", "turn {degrees}", "T{0}").priority(8),
        // three digits only, so a leftover flight number is not a heading
        t("turn_heading_bare", "turn [to] {num:100-360}", "H{0:03}").priority(3),
        t("say_heading", "say heading", "SH").priority(10),
        t("vectors_for", "vectors|vector [for] sequence|spacing|final", ""),
    ]
}

fn speed() -> Vec<CommandTemplate> {
    vec![
        t("reduce_speed", "reduce|slow [speed] [to] {speed}", "S{0}")
            .priority(10)
            .then_variant("TS{0}"),
        t("increase_speed", "increase [speed] [to] {speed}", "S{0}")
            .priority(10)
            .then_variant("TS{0}"),
        t("speed_only", "speed [to] {speed}", "S{0}").then_variant("TS{0}"),
        t("maintain_speed", "maintain [speed] {speed}", "S{0}")
            .priority(2)
            .then_variant("TS{0}")
            .say_again_on_fail(),
        t(
            "slowest_practical",
            "[maintain] slowest|minimum practical|speed|possible [approach] [speed]",
            "SMIN",
        )
        .priority(12),
        t("maximum_speed", "maximum|best forward|speed", "SMAX").priority(12),
        t("final_approach_speed", "reduce [to] final|minimum approach speed", "SMIN").priority(15),
        t("bare_speed_knots_until", "{speed} knots {speed_until}", "S{0}/U{1}"),
        t("say_speed", "say speed|airspeed", "SS").priority(10),
        t("say_indicated", "say indicated [speed|airspeed]", "SI").priority(12),
        t("say_mach", "say mach [number]", "SM").priority(12),
        t("cancel_speed_restriction", "cancel speed [restrictions|restriction]", "S").priority(10),
        t("resume_normal_speed", "resume normal speed", "S").priority(12),
        t("speed_your_discretion", "speed [at] [your] discretion", "S").priority(12),
        t("comply_speed_restrictions", "comply [with] speed restrictions", "S").priority(12),
        t("delete_speed_restrictions", "delete speed restrictions", "S").priority(12),
        t("no_speed_restrictions", "no speed restrictions", "S").priority(12),
        t("maintain_present_speed", "[maintain] present speed", "SPRES").priority(12),
        t(
            "speed_or_greater_until",
            "[maintain] {speed} [knots] or greater|better {speed_until}",
            "S{0}+/U{1}",
        )
        .priority(15),
        t("speed_or_greater", "[maintain] {speed} or greater|better", "S{0}+")
            .priority(12)
            .then_variant("TS{0}+"),
        t("do_not_exceed", "do not exceed {speed}", "S{0}-")
            .priority(12)
            .then_variant("TS{0}-"),
        // "until advised" and "for now" are no restriction limit
        t(
            "speed_until_advised_verb",
            "reduce|slow|increase|maintain [speed] [to] {speed} until|unto|intel advised|further [notice]",
            "S{0}",
        )
        .priority(18),
        t(
            "speed_until_advised_keyword",
            "speed [to] {speed} until|unto|intel advised|further [notice]",
            "S{0}",
        )
        .priority(18),
        t(
            "speed_for_now_verb",
            "reduce|slow|increase|maintain [speed] [to] {speed} for now",
            "S{0}",
        )
        .priority(18),
        t("speed_for_now_keyword", "speed [to] {speed} for now", "S{0}").priority(18),
        t("reduce_speed_until", "reduce|slow [speed] [to] {speed} {speed_until}", "S{0}/U{1}")
            .priority(15),
        t("increase_speed_until", "increase [speed] [to] {speed} {speed_until}", "S{0}/U{1}")
            .priority(15),
        t("speed_until", "speed [to] {speed} {speed_until}", "S{0}/U{1}").priority(12),
        t("maintain_speed_until", "maintain [speed] {speed} {speed_until}", "S{0}/U{1}").priority(12),
        t("reduce_mach", "reduce|slow [speed] [to] mach [point] {mach}", "M{0}").priority(12),
        t("increase_mach", "increase [speed] [to] mach [point] {mach}", "M{0}").priority(12),
        t("maintain_mach", "maintain mach [point] {mach}", "M{0}").priority(10),
        t("mach_only", "mach [point] {mach}", "M{0}").priority(7),
    ]
}

fn navigation() -> Vec<CommandTemplate> {
    vec![
        t("direct_fix", "direct|proceed [direct] [to] [at] {fix}", "D{0}").priority(10),
        // above cleared_approach, so a garbled fix asks for a repeat
        t("cleared_direct_fix", "cleared direct {fix}", "D{0}")
            .priority(12)
            .say_again_on_fail(),
        t("cleared_to_fix", "cleared [to] [at] {fix}", "D{0}").priority(7),
        t("cross_fix_altitude", "cross {fix} [at] {altitude}", "C{0}/A{1}").priority(10),
        t("cross_fix_at_or_above", "cross {fix} [at] [or] above {altitude}", "C{0}/A{1}+").priority(12),
        t("cross_fix_speed", "cross {fix} [at] {speed}", "C{0}/S{1}").priority(10),
        t(
            "cross_fix_speed_or_greater",
            "cross {fix} [at] {speed} or greater|better",
            "C{0}/S{1}+",
        )
        .priority(12),
        t(
            "cross_fix_do_not_exceed",
            "cross {fix} [at] [or] [and|at] [do] not [to] exceed {speed}",
            "C{0}/S{1}-",
        )
        .priority(12),
        t("cross_fix_mach", "cross {fix} [at] mach [point] {mach}", "C{0}/M{1}").priority(10),
        t("depart_fix_heading", "depart {fix} [heading] {heading}", "D{0}/H{1:03}").priority(10),
        t(
            "hold",
            "hold [north|south|east|west|northeast|northwest|southeast|southwest] [of] [at] [as] [published] {hold}",
            "{0}",
        )
        .priority(15),
    ]
}

fn approach() -> Vec<CommandTemplate> {
    let mut templates = vec![
        t(
            "at_fix_cleared_approach",
            "at {fix} [cleared] [clear] [for] [approach] {approach}",
            "A{0}/C{1}",
        )
        .priority(15),
        t("at_fix_intercept_localizer", "at {fix} intercept [the] localizer", "A{0}/I").priority(15),
        t(
            "at_fix_intercept_localizer_runway",
            "at {fix} intercept [the] [runway] {num:1-36} [left|right|center] localizer",
            "A{0}/I",
        )
        .priority(16),
        t("expect_approach", "expect [vectors] [for] [to] [the] {approach_lahso}", "E{0}")
            .priority(15)
            .say_again_on_fail(),
        t("standby_approach", "standby [for] [the] approach", "E").priority(14),
        t("expect_the_approach", "expect [the] approach", "E").priority(14),
        // "vectors" alone is often informational, so no say-again here
        t("vectors_approach", "vector|vectors [for] [to] {approach_lahso}", "E{0}").priority(15),
        t("cleared_approach", "cleared [approach] [for] {approach}", "C{0}")
            .priority(8)
            .say_again_on_fail(),
        t("clear_to_approach", "clear to|for [approach] {approach}", "C{0}")
            .priority(8)
            .say_again_on_fail(),
        t("localizer_approach", "localizer [approach] [acquired] {approach}", "C{0}").priority(7),
        t("cleared_straight_in", "cleared straight [in] {approach}", "CSI{0}").priority(12),
        t("cancel_approach", "cancel [approach] clearance", "CAC").priority(15),
    ];

    for (side, letter) in [("left", "L"), ("right", "R"), ("center", "C")] {
        templates.push(
            t(
                &format!("cleared_visual_{side}"),
                &format!("cleared [the] visual [approach] [runway] {{num:1-36}} {side}"),
                &format!("CVA{{0}}{letter}"),
            )
            .priority(17),
        );
        templates.push(
            t(
                &format!("expect_visual_{side}"),
                &format!("expect [the] visual [approach] [runway] {{num:1-36}} {side}"),
                &format!("EVA{{0}}{letter}"),
            )
            .priority(17),
        );
    }
    templates.extend([
        t("cleared_visual", "cleared [the] visual [approach] [runway] {num:1-36}", "CVA{0}").priority(16),
        t("expect_visual", "expect [the] visual [approach] [runway] {num:1-36}", "EVA{0}").priority(16),
    ]);

    // intercept, most specific first; garbage between "intercept" and
    // "localizer" is left to literal slack
    templates.extend([
        t(
            "intercept_localizer_runway_side",
            "intercept|join|set [the] [runway] {num:1-36} left|right|center localizer",
            "I",
        )
        .priority(14),
        t(
            "intercept_localizer_runway",
            "intercept|join|set [the] [runway] {num:1-36} localizer",
            "I",
        )
        .priority(13),
        t(
            "intercept_localizer_num_side",
            "intercept|join|set [the] {num:1-36} left|right|center localizer",
            "I",
        )
        .priority(12),
        t(
            "intercept_localizer_side",
            "intercept|join|set [the] left|right|center localizer",
            "I",
        )
        .priority(11),
        t("intercept_localizer", "intercept|join|set [the] localizer", "I").priority(10),
        t("standalone_localizer", "localizer", "I"),
        // "heading 040 vectors to the localizer" is context, not an intercept
        t(
            "vectors_localizer",
            "vectors|vector [to] [the] [for] [through] localizer",
            "",
        )
        .priority(6),
    ]);
    templates
}

fn transponder() -> Vec<CommandTemplate> {
    vec![
        t("squawk_code", "squawk [code] {squawk}", "SQ{0}").priority(10),
        t("ident", "ident", "ID").priority(10),
        t("squawk_standby", "squawk standby", "SQS").priority(12),
        t("squawk_altitude", "squawk altitude|mode", "SQA").priority(12),
        t("transponder_on", "transponder on", "SQON").priority(12),
        t("squawk_normal", "squawk normal", "SQON").priority(12),
        t("squawk_vfr", "squawk vfr|victor", "").priority(12),
    ]
}

fn handoff() -> Vec<CommandTemplate> {
    vec![
        t("radar_contact", "radar contact", "").priority(20),
        t("contact_tower", "contact tower", "TO").priority(15),
        // "konak tower": contact lost, facility kept
        t("facility_tower", "{garbled_word} tower", "TO"),
        t("contact_facility_tower", "contact {text} tower", "TO").priority(16),
        t("frequency_change", "contact approach|departure|center", "FC").priority(3),
        t("frequency_change_with_frequency", "contact {contact_frequency}", "FC").priority(4),
        // too short for a frequency: most likely a garbled "tower"
        t("contact_garbled_tower", "contact {garbled_word}", "TO").priority(2),
        t("frequency_change_approved", "frequency change approved", "").priority(15),
    ]
}

fn misc() -> Vec<CommandTemplate> {
    vec![
        t("go_ahead", "go ahead", "GA").priority(15),
        t("say_request", "say request", "GA").priority(15),
        t("radar_services_terminated", "radar services terminated", "RST").priority(15),
        t("resume_own_navigation", "resume own navigation", "RON").priority(15),
        t("vfr_altitude_discretion", "altitude discretion|your", "A").priority(10),
        t("traffic_advisory", "traffic [at] [your] {traffic}", "TRAFFIC/{0}").priority(10),
        t(
            "visual_separation",
            "maintain visual separation [from] [the] [traffic]",
            "VISSEP",
        )
        .priority(15),
        t("atis_information", "information {atis_letter} [is] [current]", "ATIS/{0}").priority(15),
        t(
            "advise_have_information",
            "advise [you] have information {atis_letter}",
            "ATIS/{0}",
        )
        .priority(15),
        t("field_in_sight", "[do] [you] [have] [the] field|airport in sight", "FS").priority(10),
    ]
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn test_catalogue_compiles() {
        for template in default_templates() {
            let name = template.name.clone();
            if let Err(err) = template.compile() {
                panic!("Template {name} does not compile: {err}");
            }
        }
    }

    #[test]
    fn test_names_are_unique() {
        let templates = default_templates();
        let names: BTreeSet<&str> = templates.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names.len(), templates.len());
    }
}
