//! Conversion job builder
//!
//! Maps a conversion target to an ordered list of fully-parameterised
//! candidate jobs. Preference tables are static; the probed
//! [`ToolAvailability`] filters them down to backends actually present.
//! Building a plan is pure: no processes are spawned and no files are
//! touched until the executor runs the plan.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::ConvertError;
use super::invocation::Invocation;
use super::probe::ToolAvailability;

/// External converter backends Prensa knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// LibreOffice in headless mode: the general office renderer. Most
    /// compatible, least faithful: always last in a preference list.
    Soffice,
    /// Ghostscript: the PDF interpreter, for rasterisation and re-writing.
    Ghostscript,
    /// Camelot: table extraction with exact grid (lattice) detection.
    Camelot,
    /// Tabula: heuristic (stream) table extraction.
    Tabula,
}

impl Backend {
    pub const ALL: [Backend; 4] = [
        Backend::Soffice,
        Backend::Ghostscript,
        Backend::Camelot,
        Backend::Tabula,
    ];

    /// Stable identifier used in logs and diagnostics.
    pub fn id(self) -> &'static str {
        match self {
            Backend::Soffice => "soffice",
            Backend::Ghostscript => "ghostscript",
            Backend::Camelot => "camelot",
            Backend::Tabula => "tabula",
        }
    }

    /// Executable name on the host.
    pub fn program(self) -> &'static str {
        match self {
            Backend::Soffice => "soffice",
            Backend::Ghostscript => "gs",
            Backend::Camelot => "camelot",
            Backend::Tabula => "tabula",
        }
    }

    /// Cheap presence check: every backend answers a version query.
    pub fn version_invocation(self) -> Invocation {
        Invocation::new(self.program()).arg("--version")
    }
}

/// Table extraction mode for spreadsheet conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableMode {
    /// Exact grid detection: best for ruled tables.
    #[default]
    Grid,
    /// Whitespace heuristics: best for unruled tables.
    Heuristic,
}

/// Output resolution for image conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageQuality {
    Low,
    #[default]
    Medium,
    High,
}

impl ImageQuality {
    /// Backend-neutral quality translated to raster DPI.
    pub fn dpi(self) -> u32 {
        match self {
            ImageQuality::Low => 72,
            ImageQuality::Medium => 150,
            ImageQuality::High => 300,
        }
    }
}

/// Ghostscript quality preset for PDF compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionPreset {
    Screen,
    #[default]
    Ebook,
    Printer,
}

impl CompressionPreset {
    fn gs_setting(self) -> &'static str {
        match self {
            CompressionPreset::Screen => "/screen",
            CompressionPreset::Ebook => "/ebook",
            CompressionPreset::Printer => "/printer",
        }
    }
}

/// What the caller wants produced from the source PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionTarget {
    /// Word document (docx).
    Word,
    /// Spreadsheet (xlsx, or the table engine's native tabular output).
    Spreadsheet { mode: TableMode },
    /// Page images (png).
    Image { quality: ImageQuality },
    /// Re-written PDF at a reduced quality preset.
    CompressedPdf { preset: CompressionPreset },
}

impl ConversionTarget {
    /// Human-readable operation name for diagnostics.
    pub fn operation(&self) -> &'static str {
        match self {
            ConversionTarget::Word => "pdf to docx",
            ConversionTarget::Spreadsheet { .. } => "pdf to xlsx",
            ConversionTarget::Image { .. } => "pdf to png",
            ConversionTarget::CompressedPdf { .. } => "pdf compression",
        }
    }

    /// Static backend preference, most faithful first.
    fn preference(&self) -> Vec<Backend> {
        match self {
            ConversionTarget::Word => vec![Backend::Soffice],
            // Grid mode favours the exact-grid engine; heuristic mode the
            // whitespace engine. The office renderer is always the
            // most-compatible-but-least-faithful last resort.
            ConversionTarget::Spreadsheet {
                mode: TableMode::Grid,
            } => vec![Backend::Camelot, Backend::Tabula, Backend::Soffice],
            ConversionTarget::Spreadsheet {
                mode: TableMode::Heuristic,
            } => vec![Backend::Tabula, Backend::Camelot, Backend::Soffice],
            ConversionTarget::Image { .. } => vec![Backend::Ghostscript, Backend::Soffice],
            ConversionTarget::CompressedPdf { .. } => vec![Backend::Ghostscript],
        }
    }
}

/// One concrete, fully-parameterised attempt at satisfying a conversion.
#[derive(Debug, Clone)]
pub struct JobCandidate {
    pub backend: Backend,
    /// Position in the plan; lower is preferred.
    pub priority: usize,
    pub invocation: Invocation,
    /// Artifact that must exist and be non-empty for the attempt to count
    /// as a success.
    pub expected_output: PathBuf,
}

/// Ordered, non-empty list of candidates for one request.
#[derive(Debug, Clone)]
pub struct FallbackPlan {
    candidates: Vec<JobCandidate>,
}

impl FallbackPlan {
    /// Wrap a candidate list. Callers must guarantee non-emptiness; the
    /// builder never constructs an empty plan.
    pub fn new(candidates: Vec<JobCandidate>) -> Self {
        debug_assert!(!candidates.is_empty());
        Self { candidates }
    }

    pub fn candidates(&self) -> &[JobCandidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Builds fallback plans from preference tables and probed availability.
pub struct PlanBuilder;

impl PlanBuilder {
    /// Build the plan for converting `input` (a PDF inside the request
    /// workspace) according to `target`, writing outputs into `work_dir`.
    pub fn build(
        target: &ConversionTarget,
        input: &Path,
        work_dir: &Path,
        availability: &ToolAvailability,
    ) -> Result<FallbackPlan, ConvertError> {
        let preference = target.preference();
        let present: Vec<Backend> = preference
            .iter()
            .copied()
            .filter(|&b| availability.has(b))
            .collect();

        if present.is_empty() {
            return Err(ConvertError::NoBackendAvailable {
                operation: target.operation().to_string(),
                considered: preference.iter().map(|b| b.id()).collect(),
            });
        }

        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());

        let candidates = present
            .into_iter()
            .enumerate()
            .map(|(priority, backend)| {
                let (invocation, expected_output) =
                    Self::candidate_invocation(backend, target, input, work_dir, &stem);
                JobCandidate {
                    backend,
                    priority,
                    invocation,
                    expected_output,
                }
            })
            .collect();

        Ok(FallbackPlan::new(candidates))
    }

    /// Translate abstract options into one backend's concrete command line.
    fn candidate_invocation(
        backend: Backend,
        target: &ConversionTarget,
        input: &Path,
        work_dir: &Path,
        stem: &str,
    ) -> (Invocation, PathBuf) {
        let input_arg = input.to_string_lossy().into_owned();
        let work_dir_arg = work_dir.to_string_lossy().into_owned();

        match (backend, target) {
            (Backend::Soffice, ConversionTarget::Word) => (
                soffice_convert("docx", &work_dir_arg, &input_arg),
                work_dir.join(format!("{}.docx", stem)),
            ),
            (Backend::Soffice, ConversionTarget::Spreadsheet { .. }) => (
                soffice_convert("xlsx", &work_dir_arg, &input_arg),
                work_dir.join(format!("{}.xlsx", stem)),
            ),
            (Backend::Soffice, ConversionTarget::Image { .. }) => (
                soffice_convert("png", &work_dir_arg, &input_arg),
                work_dir.join(format!("{}.png", stem)),
            ),
            (Backend::Ghostscript, ConversionTarget::Image { quality }) => {
                let pattern = work_dir.join(format!("{}-page%03d.png", stem));
                let first_page = work_dir.join(format!("{}-page001.png", stem));
                let invocation = Invocation::new(backend.program())
                    .args(["-dBATCH", "-dNOPAUSE", "-dSAFER"])
                    .arg("-sDEVICE=png16m")
                    .arg(format!("-r{}", quality.dpi()))
                    .arg(format!("-sOutputFile={}", pattern.display()))
                    .arg(input_arg.as_str());
                (invocation, first_page)
            }
            (Backend::Ghostscript, ConversionTarget::CompressedPdf { preset }) => {
                let output = work_dir.join(format!("{}-compressed.pdf", stem));
                let invocation = Invocation::new(backend.program())
                    .args(["-dBATCH", "-dNOPAUSE", "-dSAFER"])
                    .arg("-sDEVICE=pdfwrite")
                    .arg(format!("-dPDFSETTINGS={}", preset.gs_setting()))
                    .arg(format!("-sOutputFile={}", output.display()))
                    .arg(input_arg.as_str());
                (invocation, output)
            }
            (Backend::Camelot, ConversionTarget::Spreadsheet { mode }) => {
                let output = work_dir.join(format!("{}.xlsx", stem));
                let flavor = match mode {
                    TableMode::Grid => "lattice",
                    TableMode::Heuristic => "stream",
                };
                let invocation = Invocation::new(backend.program())
                    .args(["--pages", "all"])
                    .args(["--format", "excel"])
                    .arg("--output")
                    .arg(output.to_string_lossy())
                    .arg(flavor)
                    .arg(input_arg.as_str());
                (invocation, output)
            }
            (Backend::Tabula, ConversionTarget::Spreadsheet { mode }) => {
                let output = work_dir.join(format!("{}.csv", stem));
                let detection = match mode {
                    TableMode::Grid => "--lattice",
                    TableMode::Heuristic => "--stream",
                };
                let invocation = Invocation::new(backend.program())
                    .args(["--pages", "all"])
                    .args(["--format", "CSV"])
                    .arg(detection)
                    .arg("--outfile")
                    .arg(output.to_string_lossy())
                    .arg(input_arg.as_str());
                (invocation, output)
            }
            // Preference tables never pair other combinations.
            (backend, target) => {
                unreachable!("no invocation for {:?} with {:?}", backend, target)
            }
        }
    }
}

fn soffice_convert(format: &str, out_dir: &str, input: &str) -> Invocation {
    Invocation::new("soffice")
        .arg("--headless")
        .args(["--convert-to", format])
        .args(["--outdir", out_dir])
        .arg(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_available() -> ToolAvailability {
        ToolAvailability {
            soffice: true,
            ghostscript: true,
            camelot: true,
            tabula: true,
        }
    }

    fn backends(plan: &FallbackPlan) -> Vec<Backend> {
        plan.candidates().iter().map(|c| c.backend).collect()
    }

    #[test]
    fn grid_mode_prefers_exact_grid_engine() {
        let plan = PlanBuilder::build(
            &ConversionTarget::Spreadsheet {
                mode: TableMode::Grid,
            },
            Path::new("/work/in.pdf"),
            Path::new("/work"),
            &all_available(),
        )
        .unwrap();

        assert_eq!(
            backends(&plan),
            vec![Backend::Camelot, Backend::Tabula, Backend::Soffice]
        );
    }

    #[test]
    fn heuristic_mode_prefers_stream_engine() {
        let plan = PlanBuilder::build(
            &ConversionTarget::Spreadsheet {
                mode: TableMode::Heuristic,
            },
            Path::new("/work/in.pdf"),
            Path::new("/work"),
            &all_available(),
        )
        .unwrap();

        assert_eq!(
            backends(&plan),
            vec![Backend::Tabula, Backend::Camelot, Backend::Soffice]
        );
    }

    #[test]
    fn missing_backends_are_filtered_preserving_order() {
        let availability = ToolAvailability {
            soffice: true,
            ghostscript: false,
            camelot: false,
            tabula: true,
        };
        let plan = PlanBuilder::build(
            &ConversionTarget::Spreadsheet {
                mode: TableMode::Grid,
            },
            Path::new("/work/in.pdf"),
            Path::new("/work"),
            &availability,
        )
        .unwrap();

        assert_eq!(backends(&plan), vec![Backend::Tabula, Backend::Soffice]);
        let priorities: Vec<usize> = plan.candidates().iter().map(|c| c.priority).collect();
        assert_eq!(priorities, vec![0, 1]);
    }

    #[test]
    fn empty_filtered_list_is_no_backend_available() {
        let availability = ToolAvailability {
            camelot: true,
            tabula: true,
            ..ToolAvailability::none()
        };
        let err = PlanBuilder::build(
            &ConversionTarget::Word,
            Path::new("/work/in.pdf"),
            Path::new("/work"),
            &availability,
        )
        .unwrap_err();

        match err {
            ConvertError::NoBackendAvailable {
                operation,
                considered,
            } => {
                assert_eq!(operation, "pdf to docx");
                assert_eq!(considered, vec!["soffice"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn image_quality_maps_to_dpi_flag() {
        let plan = PlanBuilder::build(
            &ConversionTarget::Image {
                quality: ImageQuality::High,
            },
            Path::new("/work/scan.pdf"),
            Path::new("/work"),
            &all_available(),
        )
        .unwrap();

        let gs = &plan.candidates()[0];
        assert_eq!(gs.backend, Backend::Ghostscript);
        assert!(gs
            .invocation
            .arg_list()
            .iter()
            .any(|a| a == "-r300"));
        assert!(gs.expected_output.ends_with("scan-page001.png"));
    }

    #[test]
    fn compression_preset_maps_to_pdfsettings() {
        let plan = PlanBuilder::build(
            &ConversionTarget::CompressedPdf {
                preset: CompressionPreset::Screen,
            },
            Path::new("/work/big.pdf"),
            Path::new("/work"),
            &all_available(),
        )
        .unwrap();

        assert_eq!(plan.len(), 1);
        assert!(plan.candidates()[0]
            .invocation
            .arg_list()
            .iter()
            .any(|a| a == "-dPDFSETTINGS=/screen"));
    }

    #[test]
    fn hostile_filenames_stay_single_arguments() {
        let plan = PlanBuilder::build(
            &ConversionTarget::Word,
            Path::new("/work/report; rm -rf.pdf"),
            Path::new("/work"),
            &all_available(),
        )
        .unwrap();

        let soffice = &plan.candidates()[0];
        assert!(soffice
            .invocation
            .arg_list()
            .contains(&"/work/report; rm -rf.pdf".to_string()));
    }
}
