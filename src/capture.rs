//! Diagnostic capture: observers invoked by the training loop and the
//! append-only log of what they recorded.
use crate::config::SummaryKind;
use crate::dnn::DNN;
use crate::error::CaptureError;
use crate::stats::{
    empirical_covariance, empirical_mean, histogram_2d, principal_axes_2d, Histogram2d,
    PrincipalAxes,
};
use crate::GanFloat;
use log::{debug, info};
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Hook called by [`crate::TrainingSession::run`] on the capture cadence.
pub trait Observer {
    /// # Errors
    /// Any failure aborts the run.
    fn observe(
        &mut self,
        iteration: usize,
        generator: &DNN,
        noise: &Array2<GanFloat>,
    ) -> Result<(), CaptureError>;
}

impl<F> Observer for F
where
    F: FnMut(usize, &DNN, &Array2<GanFloat>) -> Result<(), CaptureError>,
{
    fn observe(
        &mut self,
        iteration: usize,
        generator: &DNN,
        noise: &Array2<GanFloat>,
    ) -> Result<(), CaptureError> {
        self(iteration, generator, noise)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Summary {
    Samples {
        points: Vec<Vec<GanFloat>>,
    },
    MeanCovariance {
        mean: Vec<GanFloat>,
        covariance: Vec<Vec<GanFloat>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        axes: Option<PrincipalAxes>,
    },
    Histogram(Histogram2d),
}

fn round2(x: GanFloat) -> GanFloat {
    (x * 100.).round() / 100.
}

fn to_rows(x: &ArrayView2<GanFloat>) -> Vec<Vec<GanFloat>> {
    x.rows().into_iter().map(|row| row.to_vec()).collect()
}

impl Summary {
    /// # Errors
    /// When `samples` does not carry enough rows or the right dimension for `kind`.
    pub fn compute(kind: &SummaryKind, samples: &ArrayView2<GanFloat>) -> Result<Self, CaptureError> {
        Ok(match *kind {
            SummaryKind::Samples => Self::Samples {
                points: to_rows(&samples.mapv(round2).view()),
            },
            SummaryKind::MeanCovariance => {
                let mean = empirical_mean(samples)?;
                let cov = empirical_covariance(samples)?;
                let axes = if cov.nrows() == 2 {
                    Some(principal_axes_2d(&cov.view())?)
                } else {
                    None
                };
                Self::MeanCovariance {
                    mean: mean.to_vec(),
                    covariance: to_rows(&cov.view()),
                    axes,
                }
            }
            SummaryKind::Histogram { range, quant } => {
                Self::Histogram(histogram_2d(samples, range, quant)?)
            }
        })
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Snapshot {
    pub iteration: usize,
    pub summary: Summary,
}

/// Ordered, append-only list of snapshots.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct DiagnosticLog {
    snapshots: Vec<Snapshot>,
}

impl DiagnosticLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, snapshot: Snapshot) {
        self.snapshots.push(snapshot);
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// # Errors
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<(), CaptureError> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        info!("wrote {} snapshots to {}", self.len(), path.display());
        Ok(())
    }

    /// # Errors
    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Self, CaptureError> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

/// Observer that runs the generator on the evaluation noise and appends one
/// [`Summary`] of the output per capture.
#[derive(Clone, Debug)]
pub struct Recorder {
    kind: SummaryKind,
    log: DiagnosticLog,
}

impl Recorder {
    pub fn new(kind: SummaryKind) -> Self {
        Self {
            kind,
            log: DiagnosticLog::new(),
        }
    }

    pub fn kind(&self) -> &SummaryKind {
        &self.kind
    }

    pub fn log(&self) -> &DiagnosticLog {
        &self.log
    }

    pub fn into_log(self) -> DiagnosticLog {
        self.log
    }
}

impl Observer for Recorder {
    fn observe(
        &mut self,
        iteration: usize,
        generator: &DNN,
        noise: &Array2<GanFloat>,
    ) -> Result<(), CaptureError> {
        let samples = generator.forward(noise);
        let summary = Summary::compute(&self.kind, &samples.view())?;
        debug!("snapshot at iteration {} over {} samples", iteration, samples.nrows());
        self.log.push(Snapshot { iteration, summary });
        Ok(())
    }
}
