//! HTML charts of training runs.

use std::fs;
use std::path::{Path, PathBuf};

use plotly::common::{Mode, Position, Title};
use plotly::layout::{Axis, Layout};
use plotly::{Plot, Scatter};

use crate::error::Result;
use crate::experiment::SummaryRow;
use crate::optimizers::History;

fn curve(
    training: &[f64],
    validation: &[f64],
    title: &str,
    y_label: &str,
    series: (&str, &str),
) -> Plot {
    let epochs = (1..=training.len()).collect::<Vec<usize>>();
    let mut plot = Plot::new();

    plot.add_trace(
        Scatter::new(epochs.clone(), training.to_vec())
            .mode(Mode::Markers)
            .name(series.0),
    );
    if !validation.is_empty() {
        let val_epochs = (1..=validation.len()).collect::<Vec<usize>>();
        plot.add_trace(
            Scatter::new(val_epochs, validation.to_vec())
                .mode(Mode::Lines)
                .name(series.1),
        );
    }

    plot.set_layout(
        Layout::new()
            .title(Title::new(title))
            .x_axis(Axis::new().title(Title::new("Epochs")))
            .y_axis(Axis::new().title(Title::new(y_label))),
    );
    plot
}

/// Training vs validation loss and accuracy, one file each.
pub fn training_curves(history: &History, dir: &Path, stem: &str) -> Result<(PathBuf, PathBuf)> {
    fs::create_dir_all(dir)?;

    let loss_path = dir.join(format!("{stem}_loss.html"));
    curve(
        &history.loss,
        &history.val_loss,
        "Training and validation loss",
        "Loss",
        ("Training loss", "Validation loss"),
    )
    .write_html(&loss_path);

    let accuracy_path = dir.join(format!("{stem}_accuracy.html"));
    curve(
        &history.accuracy,
        &history.val_accuracy,
        "Training and validation accuracy",
        "Accuracy",
        ("Training acc", "Validation acc"),
    )
    .write_html(&accuracy_path);

    Ok((loss_path, accuracy_path))
}

/// Loss against accuracy for every compared model, labelled by name.
pub fn summary_scatter(rows: &[SummaryRow], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let loss = rows.iter().map(|r| r.loss).collect::<Vec<f64>>();
    let accuracy = rows.iter().map(|r| r.accuracy).collect::<Vec<f64>>();
    let labels = rows.iter().map(|r| r.name.clone()).collect::<Vec<String>>();

    let mut plot = Plot::new();
    plot.add_trace(
        Scatter::new(loss, accuracy)
            .mode(Mode::MarkersText)
            .text_array(labels)
            .text_position(Position::TopCenter)
            .name("Models"),
    );
    plot.set_layout(
        Layout::new()
            .title(Title::new("Summary for Accuracy and Loss"))
            .x_axis(Axis::new().title(Title::new("Loss")))
            .y_axis(Axis::new().title(Title::new("Accuracy"))),
    );
    plot.write_html(path);

    Ok(())
}
