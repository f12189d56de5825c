//! Simulation protocols and their per-protocol field tables.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Protocol {
    #[serde(rename = "MF62", alias = "MF6.2")]
    Mf62,
    #[serde(rename = "MF52", alias = "MF5.2")]
    Mf52,
    #[serde(rename = "FTire")]
    FTire,
    #[serde(rename = "CDTire")]
    CdTire,
    #[serde(rename = "Custom")]
    Custom,
}

/// Descriptive fields of a Run Record, across all protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    TestName,
    Tests,
    InflationPressure,
    Ips,
    Loads,
    Velocity,
    TestVelocity,
    Preload,
    Camber,
    InclinationAngle,
    SlipAngle,
    SlipRatio,
    LongitudinalSlip,
    Displacement,
    SlipRange,
    Cleat,
    CleatOrientation,
    RoadSurface,
    Job,
    OldJob,
    FortranFile,
    PythonScript,
    TemplateTydex,
    TydexName,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Field::TestName => "test_name",
            Field::Tests => "tests",
            Field::InflationPressure => "inflation_pressure",
            Field::Ips => "ips",
            Field::Loads => "loads",
            Field::Velocity => "velocity",
            Field::TestVelocity => "test_velocity",
            Field::Preload => "preload",
            Field::Camber => "camber",
            Field::InclinationAngle => "inclination_angle",
            Field::SlipAngle => "slip_angle",
            Field::SlipRatio => "slip_ratio",
            Field::LongitudinalSlip => "longitudinal_slip",
            Field::Displacement => "displacement",
            Field::SlipRange => "slip_range",
            Field::Cleat => "cleat",
            Field::CleatOrientation => "cleat_orientation",
            Field::RoadSurface => "road_surface",
            Field::Job => "job",
            Field::OldJob => "old_job",
            Field::FortranFile => "fortran_file",
            Field::PythonScript => "python_script",
            Field::TemplateTydex => "template_tydex",
            Field::TydexName => "tydex_name",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a header cell is recognised as a field's column.
///
/// The header matches when its normalized text contains `marker` and none
/// of the `exclude` fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMarker {
    pub field: Field,
    pub marker: &'static str,
    pub exclude: &'static [&'static str],
}

impl FieldMarker {
    /// `header` must already be normalized.
    pub fn matches(&self, header: &str) -> bool {
        header.contains(self.marker) && !self.exclude.iter().any(|x| header.contains(x))
    }
}

const fn marker(field: Field, marker: &'static str) -> FieldMarker {
    FieldMarker {
        field,
        marker,
        exclude: &[],
    }
}

const fn marker_excluding(
    field: Field,
    marker: &'static str,
    exclude: &'static [&'static str],
) -> FieldMarker {
    FieldMarker {
        field,
        marker,
        exclude,
    }
}

// "test" also appears in the run-number and velocity headers.
const TESTS_EXCLUDES: &[&str] = &["no of", "velocity", "name"];

/// Header marker of the run-number column.
pub const RUN_NUMBER_MARKER: &str = "no of tests";

// Job/template columns shared by every protocol sheet.
const ARTIFACT_MARKERS: [FieldMarker; 6] = [
    marker_excluding(Field::Job, "job", &["old"]),
    marker(Field::OldJob, "old job"),
    marker(Field::FortranFile, "fortran"),
    marker(Field::PythonScript, "python"),
    marker(Field::TemplateTydex, "template tydex"),
    marker(Field::TydexName, "tydex name"),
];

const MF62_MARKERS: [FieldMarker; 7] = [
    marker_excluding(Field::Tests, "test", TESTS_EXCLUDES),
    marker(Field::Ips, "pressure"),
    marker(Field::Loads, "load"),
    marker(Field::InclinationAngle, "inclination"),
    marker(Field::SlipAngle, "slip angle"),
    marker(Field::SlipRatio, "slip ratio"),
    marker(Field::TestVelocity, "velocity"),
];

const MF52_MARKERS: [FieldMarker; 7] = [
    marker_excluding(Field::Tests, "test", TESTS_EXCLUDES),
    marker(Field::InflationPressure, "pressure"),
    marker(Field::Loads, "load"),
    marker(Field::InclinationAngle, "inclination"),
    marker(Field::SlipAngle, "slip angle"),
    marker(Field::SlipRatio, "slip ratio"),
    marker(Field::TestVelocity, "velocity"),
];

const FTIRE_MARKERS: [FieldMarker; 8] = [
    marker_excluding(Field::Tests, "test", TESTS_EXCLUDES),
    marker(Field::Loads, "load"),
    marker(Field::InflationPressure, "pressure"),
    marker(Field::TestVelocity, "velocity"),
    marker(Field::LongitudinalSlip, "longitudinal slip"),
    marker(Field::SlipAngle, "slip angle"),
    marker(Field::InclinationAngle, "inclination"),
    marker(Field::CleatOrientation, "cleat"),
];

const CDTIRE_MARKERS: [FieldMarker; 10] = [
    marker(Field::TestName, "test name"),
    marker(Field::InflationPressure, "inflation pressure"),
    marker(Field::Velocity, "velocity"),
    marker(Field::Preload, "preload"),
    marker(Field::Camber, "camber"),
    marker(Field::SlipAngle, "slip angle"),
    marker(Field::Displacement, "displacement"),
    marker(Field::SlipRange, "slip range"),
    marker(Field::Cleat, "cleat"),
    marker(Field::RoadSurface, "road surface"),
];

const CUSTOM_MARKERS: [FieldMarker; 9] = [
    marker_excluding(Field::Tests, "test", TESTS_EXCLUDES),
    marker(Field::InflationPressure, "pressure"),
    marker(Field::Loads, "load"),
    marker(Field::InclinationAngle, "inclination"),
    marker(Field::SlipAngle, "slip angle"),
    marker(Field::SlipRatio, "slip ratio"),
    marker(Field::TestVelocity, "velocity"),
    marker(Field::CleatOrientation, "cleat"),
    marker(Field::Displacement, "displacement"),
];

const ARTIFACT_FIELDS: [Field; 4] = [
    Field::Job,
    Field::OldJob,
    Field::TemplateTydex,
    Field::TydexName,
];

impl Protocol {
    pub const ALL: [Protocol; 5] = [
        Protocol::Mf62,
        Protocol::Mf52,
        Protocol::FTire,
        Protocol::CdTire,
        Protocol::Custom,
    ];

    /// Canonical key used in store paths and collaborator calls.
    pub fn key(self) -> &'static str {
        match self {
            Protocol::Mf62 => "MF62",
            Protocol::Mf52 => "MF52",
            Protocol::FTire => "FTire",
            Protocol::CdTire => "CDTire",
            Protocol::Custom => "Custom",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Protocol::Mf62 => "MF 6.2 Protocol",
            Protocol::Mf52 => "MF 5.2 Protocol",
            Protocol::FTire => "FTire Protocol",
            Protocol::CdTire => "CDTire Protocol",
            Protocol::Custom => "Custom Protocol",
        }
    }

    /// Descriptive markers specific to this protocol's sheet.
    fn descriptive_markers(self) -> &'static [FieldMarker] {
        match self {
            Protocol::Mf62 => &MF62_MARKERS,
            Protocol::Mf52 => &MF52_MARKERS,
            Protocol::FTire => &FTIRE_MARKERS,
            Protocol::CdTire => &CDTIRE_MARKERS,
            Protocol::Custom => &CUSTOM_MARKERS,
        }
    }

    /// Every marker the column resolver looks for, descriptive fields first.
    pub fn markers(self) -> Vec<FieldMarker> {
        self.descriptive_markers()
            .iter()
            .chain(ARTIFACT_MARKERS.iter())
            .copied()
            .collect()
    }

    /// Field columns shown in the matrix, in display order.
    pub fn display_fields(self) -> Vec<Field> {
        self.descriptive_markers().iter().map(|m| m.field).collect()
    }

    /// Rows whose label field is empty are not rendered.
    pub fn label_field(self) -> Field {
        match self {
            Protocol::CdTire => Field::TestName,
            _ => Field::Tests,
        }
    }

    /// Export column order: descriptive fields then job/template fields.
    /// `number_of_runs`, `p` and `l` are framed around these by the exporter.
    pub fn export_fields(self) -> Vec<Field> {
        let mut fields = self.display_fields();
        fields.extend(ARTIFACT_FIELDS);
        fields
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Protocol {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match compact.as_str() {
            "mf62" | "mf6pt2" => Ok(Protocol::Mf62),
            "mf52" | "mf5pt2" => Ok(Protocol::Mf52),
            "ftire" => Ok(Protocol::FTire),
            "cdtire" => Ok(Protocol::CdTire),
            "custom" => Ok(Protocol::Custom),
            _ => Err(CoreError::UnknownProtocol(s.to_string())),
        }
    }
}
