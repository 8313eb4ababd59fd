use stanza::style::HAlign::Left;
use stanza::style::{HAlign, Header, MinWidth, Styles};
use stanza::table::{Col, Row, Table};
use strum::IntoEnumIterator;

use crate::domain::{Position, Round};
use crate::eval::Metrics;
use crate::feature::TrainingRow;
use crate::model::{LinearBaseline, RankedPrediction};

pub fn tabulate_predictions(predictions: &[RankedPrediction]) -> Table {
    let mut table = Table::default()
        .with_cols(vec![
            Col::new(Styles::default().with(MinWidth(5)).with(Left)),
            Col::new(Styles::default().with(MinWidth(20)).with(Left)),
            Col::new(Styles::default().with(MinWidth(5)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(8)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(9)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(3))),
        ])
        .with_row(Row::new(
            Styles::default().with(Header(true)),
            vec![
                "Pos".into(),
                "Player".into(),
                "Team".into(),
                "Raw".into(),
                "Points".into(),
                "".into(),
            ],
        ));
    for prediction in predictions {
        table.push_row(Row::new(
            Styles::default(),
            vec![
                prediction.position.code().into(),
                prediction.name.clone().into(),
                format!("{}", prediction.team_id).into(),
                format!("{:.3}", prediction.raw_score).into(),
                format!("{:.3}", prediction.predicted_points).into(),
                (if prediction.low_confidence { "?" } else { "" }).into(),
            ],
        ));
    }
    table
}

pub fn tabulate_metrics(metrics: &[(String, Metrics)]) -> Table {
    let mut table = Table::default()
        .with_cols(vec![
            Col::new(Styles::default().with(MinWidth(16)).with(Left)),
            Col::new(Styles::default().with(MinWidth(7)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(7)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(7)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(9)).with(HAlign::Right)),
        ])
        .with_row(Row::new(
            Styles::default().with(Header(true)),
            vec![
                "Model".into(),
                "Samples".into(),
                "RMSE".into(),
                "MAE".into(),
                "Spearman".into(),
            ],
        ));
    for (label, metrics) in metrics {
        table.push_row(Row::new(
            Styles::default(),
            vec![
                label.clone().into(),
                format!("{}", metrics.samples).into(),
                format!("{:.3}", metrics.rmse).into(),
                format!("{:.3}", metrics.mae).into(),
                metrics
                    .spearman
                    .map_or("-".to_string(), |rho| format!("{rho:.3}"))
                    .into(),
            ],
        ));
    }
    table
}

fn significance(p_value: f64) -> &'static str {
    match p_value {
        p if p < 0.001 => "***",
        p if p < 0.01 => "**",
        p if p < 0.05 => "*",
        p if p < 0.1 => ".",
        _ => "",
    }
}

pub fn tabulate_baseline(baseline: &LinearBaseline) -> Table {
    let mut table = Table::default()
        .with_cols(vec![
            Col::new(Styles::default()),
            Col::new(Styles::default().with(MinWidth(12)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(11)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(9)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(5))),
        ])
        .with_row(Row::new(
            Styles::default().with(Header(true)),
            vec![
                "Regressor".into(),
                "Coefficient".into(),
                "Std. error".into(),
                "P-value".into(),
                "".into(),
            ],
        ));
    let regressors = std::iter::once("intercept".to_string())
        .chain(baseline.features.iter().map(|feature| feature.to_string()));
    for (index, regressor) in regressors.enumerate() {
        let p_value = baseline.p_values.get(index).copied().unwrap_or(f64::NAN);
        table.push_row(Row::new(
            Styles::default(),
            vec![
                regressor.into(),
                format!("{:.8}", baseline.coefficients.get(index).copied().unwrap_or(f64::NAN)).into(),
                format!("{:.6}", baseline.std_errors.get(index).copied().unwrap_or(f64::NAN)).into(),
                format!("{p_value:.6}").into(),
                significance(p_value).into(),
            ],
        ));
    }
    table
}

/// Per-round row counts and mean realised points, by position.
pub fn tabulate_dataset(rows: &[TrainingRow]) -> Table {
    let mut cols = vec![Col::new(Styles::default().with(MinWidth(6)).with(HAlign::Right))];
    let mut header = vec!["Round".into()];
    for position in Position::iter() {
        cols.push(Col::new(Styles::default().with(MinWidth(12)).with(HAlign::Right)));
        header.push(position.code().into());
    }
    let mut table = Table::default()
        .with_cols(cols)
        .with_row(Row::new(Styles::default().with(Header(true)), header));

    let mut rounds = rows
        .iter()
        .map(|row| row.features.target_round)
        .collect::<Vec<Round>>();
    rounds.sort();
    rounds.dedup();
    for round in rounds {
        let mut cells = vec![format!("{round}").into()];
        for position in Position::iter() {
            let points = rows
                .iter()
                .filter(|row| row.features.target_round == round && row.features.position == position)
                .map(|row| row.target_points)
                .collect::<Vec<_>>();
            let cell = if points.is_empty() {
                "-".to_string()
            } else {
                format!(
                    "{} @ {:.2}",
                    points.len(),
                    points.iter().sum::<f64>() / points.len() as f64
                )
            };
            cells.push(cell.into());
        }
        table.push_row(Row::new(Styles::default(), cells));
    }
    table
}
