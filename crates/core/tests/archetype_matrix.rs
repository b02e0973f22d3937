use roicast_core::benchmarks::{COMPANY_SIZES, INDUSTRIES};
use roicast_core::classifier::PROFILES;
use roicast_core::{
    archetypes, calculate_roi, classify_archetype, get_archetype_input_defaults, map_archetype_to_overrides,
    validate_archetype_inputs, ArchetypeAnswers, ArchetypeId, BenchmarkTables, InputProfile, ProfileAnswers,
};
use serde_json::Value;

type ArchetypeMatrixTestResult<T = ()> = Result<T, String>;

macro_rules! require {
    ($condition:expr, $($arg:tt)+) => {
        if !$condition {
            return Err(format!($($arg)+));
        }
    };
}

macro_rules! require_eq {
    ($left:expr, $right:expr, $($arg:tt)+) => {{
        let left = &$left;
        let right = &$right;
        if left != right {
            return Err(format!("{}: left={left:?} right={right:?}", format!($($arg)+)));
        }
    }};
}

fn default_answers(id: ArchetypeId) -> ArchetypeMatrixTestResult<ArchetypeAnswers> {
    let defaults = get_archetype_input_defaults(id.as_str());
    require_eq!(defaults.len(), 8, "{id} default count");

    let mut answers = ArchetypeAnswers::new();
    for (key, value) in defaults {
        let number = serde_json::Number::from_f64(value).ok_or_else(|| format!("{id}.{key} is not finite"))?;
        answers.insert(key, Value::Number(number));
    }
    Ok(answers)
}

#[test]
fn registry_lists_every_archetype_once_in_order() -> ArchetypeMatrixTestResult {
    let ids: Vec<ArchetypeId> = archetypes().iter().map(|schema| schema.id).collect();
    require_eq!(ids, ArchetypeId::ALL.to_vec(), "registry order");
    for schema in archetypes() {
        require!(!schema.mappings.is_empty(), "{} has no computed mappings", schema.id);
        for field in &schema.inputs {
            require!(
                field.min <= field.default && field.default <= field.max,
                "{}.{} default {} outside [{}, {}]",
                schema.id,
                field.key,
                field.default,
                field.min,
                field.max
            );
        }
    }
    Ok(())
}

#[test]
fn defaults_validate_cleanly_and_map_to_finite_overrides() -> ArchetypeMatrixTestResult {
    for id in ArchetypeId::ALL {
        let answers = default_answers(id)?;
        let errors = validate_archetype_inputs(id.as_str(), &answers);
        require!(errors.is_empty(), "{id} defaults rejected: {errors:?}");

        let overrides = map_archetype_to_overrides(id.as_str(), &answers);
        require!(!overrides.is_empty(), "{id} produced no overrides");
        for (field, value) in &overrides {
            require!(value.is_finite(), "{id} override {} is {value}", field.as_str());
        }
    }
    Ok(())
}

#[test]
fn out_of_range_answers_are_all_reported() -> ArchetypeMatrixTestResult {
    let schema = archetypes().first().ok_or("empty registry")?;
    let mut answers = ArchetypeAnswers::new();
    for field in schema.inputs.iter().take(2) {
        let above = serde_json::Number::from_f64(field.max + 1.0).ok_or("max is not finite")?;
        answers.insert(field.key.to_owned(), Value::Number(above));
    }
    answers.insert("notAnInput".to_owned(), Value::from(1));

    let errors = validate_archetype_inputs(schema.id.as_str(), &answers);
    require_eq!(errors.len(), 3, "one error per offending field");
    Ok(())
}

#[test]
fn every_archetype_industry_and_size_calculates() -> ArchetypeMatrixTestResult {
    let tables = BenchmarkTables::standard();
    for schema in archetypes() {
        let answers = default_answers(schema.id)?;
        for industry in INDUSTRIES {
            for company_size in COMPANY_SIZES {
                let label = format!("{}/{industry}/{company_size}", schema.id);
                let profile = InputProfile {
                    industry: (*industry).to_owned(),
                    company_size: (*company_size).to_owned(),
                    process_type: schema.process_type.to_owned(),
                    archetype_id: Some(schema.id.as_str().to_owned()),
                    archetype_inputs: answers.clone(),
                    ..InputProfile::default()
                };
                let result = calculate_roi(&profile, &tables).map_err(|error| format!("{label}: {error}"))?;

                require!(!result.applied_overrides.is_empty(), "{label}: overrides were not applied");
                for scenario in result.scenarios.all() {
                    require!(
                        scenario.npv.is_finite() && scenario.roic.is_finite(),
                        "{label}: non-finite npv {} or roic {}",
                        scenario.npv,
                        scenario.roic
                    );
                    require!(scenario.irr.is_nan() || scenario.irr.is_finite(), "{label}: infinite irr");
                    require!(
                        scenario.payback_months.map_or(true, f64::is_finite),
                        "{label}: non-finite payback"
                    );
                }
                require!(result.expected_npv.is_finite(), "{label}: non-finite expected npv");
            }
        }
    }
    Ok(())
}

#[test]
fn each_profile_classifies_as_itself_with_full_score() -> ArchetypeMatrixTestResult {
    for (id, coordinates) in PROFILES {
        let matches = classify_archetype(&ProfileAnswers::new(coordinates));
        require_eq!(matches.len(), 3, "{id} match count");
        let best = matches.first().ok_or_else(|| format!("{id}: no matches"))?;
        require_eq!(best.archetype_id, id, "{id} best match");
        require_eq!(best.score, 30.0, "{id} best score");
        require_eq!(best.match_percent, 100.0, "{id} match percent");
    }
    Ok(())
}

#[test]
fn unanswered_questions_count_as_neutral() -> ArchetypeMatrixTestResult {
    let blank = classify_archetype(&ProfileAnswers::default());
    let neutral = classify_archetype(&ProfileAnswers::new([3.0; 6]));
    require_eq!(blank, neutral, "blank answers should rank like all-neutral answers");
    Ok(())
}
