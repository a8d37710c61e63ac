//! Terminal form for collecting delivery attributes
//!
//! Prompts for every feature in registry order, then shows the prediction.
//! A bad submission prints its error and the form starts over; end of input
//! closes the session.

use std::io::{BufRead, Write};

use super::inference::{format_prediction, Predictor};
use crate::features::catalog::prompt_for;
use crate::features::{FeatureKind, FeatureSpec, RawValues};
use crate::model::DeliveryModel;
use crate::Result;

/// Outcome counts for a form session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormSummary {
    pub predicted: usize,
    pub rejected: usize,
}

/// Prompt text for one feature, listing choices or the usual range
pub fn prompt_line(spec: &FeatureSpec) -> String {
    let label = prompt_for(&spec.name);
    match &spec.kind {
        FeatureKind::Numeric { bounds: Some(b) } => format!("{} {}: ", label, b),
        FeatureKind::Numeric { bounds: None } => format!("{}: ", label),
        FeatureKind::Categorical { domain } | FeatureKind::BooleanLike { domain } => {
            format!("{} ({}): ", label, domain.join(" / "))
        }
    }
}

/// Run the form until the input is exhausted
pub fn run_form<M, R, W>(predictor: &Predictor<'_, M>, mut input: R, mut output: W) -> Result<FormSummary>
where
    M: DeliveryModel + ?Sized,
    R: BufRead,
    W: Write,
{
    let mut summary = FormSummary::default();

    loop {
        writeln!(output, "\nDelivery Time Prediction")?;
        writeln!(output, "────────────────────────")?;

        let mut raw = RawValues::new();
        for spec in predictor.registry().list_features() {
            write!(output, "{}", prompt_line(spec))?;
            output.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                return Ok(summary);
            }
            raw.insert(spec.name.clone(), line.trim_end_matches(['\r', '\n']));
        }

        let request = match predictor.build(&raw) {
            Ok(request) => request,
            Err(e) if e.is_request_error() => {
                writeln!(output, "Error: {}", e)?;
                summary.rejected += 1;
                continue;
            }
            Err(e) => return Err(e),
        };

        for violation in request.bound_violations() {
            writeln!(output, "Warning: {}", violation)?;
        }

        match predictor.predict_request(&request) {
            Ok(pred) => {
                writeln!(output, "{}", format_prediction(&pred))?;
                summary.predicted += 1;
            }
            Err(e) if e.is_request_error() => {
                writeln!(output, "Error: {}", e)?;
                summary.rejected += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{Bounds, FeatureTable, SchemaRegistry};

    struct FixedModel(f64);

    impl DeliveryModel for FixedModel {
        fn columns(&self) -> Vec<&str> {
            vec!["age", "weather"]
        }

        fn predict(&self, _table: &FeatureTable) -> Result<Vec<f64>> {
            Ok(vec![self.0])
        }
    }

    fn registry() -> SchemaRegistry {
        SchemaRegistry::new(vec![
            FeatureSpec::numeric("age", Some(Bounds::new(20.0, 50.0))),
            FeatureSpec::categorical("weather", vec!["Sunny", "Stormy"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_prompt_lines() {
        let reg = registry();
        let features = reg.list_features();
        assert_eq!(prompt_line(&features[0]), "Rider age [20, 50]: ");
        assert_eq!(prompt_line(&features[1]), "Weather condition (Sunny / Stormy): ");
    }

    #[test]
    fn test_session_recovers_from_bad_submission() {
        let reg = registry();
        let model = FixedModel(24.5);
        let predictor = Predictor::new(&reg, &model);

        let input = "30\nFoggy\nabc\nSunny\n62\nStormy\n";
        let mut output = Vec::new();
        let summary = run_form(&predictor, input.as_bytes(), &mut output).unwrap();

        assert_eq!(summary, FormSummary { predicted: 1, rejected: 2 });

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("Error: 'Foggy' is not a known value for 'weather'"));
        assert!(text.contains("Error: Field 'age' expects a number, got 'abc'"));
        assert!(text.contains("Warning: age = 62 is outside the usual range [20, 50]"));
        assert!(text.contains("The Delivery Time is 24.50 mins"));
    }

    #[test]
    fn test_empty_input_ends_session() {
        let reg = registry();
        let model = FixedModel(10.0);
        let predictor = Predictor::new(&reg, &model);

        let summary = run_form(&predictor, "".as_bytes(), Vec::new()).unwrap();
        assert_eq!(summary, FormSummary::default());
    }
}
