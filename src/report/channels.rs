// src/report/channels.rs
//
// Which cells each table contributes and how they are typed.

use super::{Conversion, FieldSpec, ReportSpec};
use crate::parse::FieldKind;

const fn text(label: &'static str, field: &'static str) -> FieldSpec {
    FieldSpec {
        label,
        field,
        conversion: Conversion::Text,
    }
}

const fn measure(label: &'static str, field: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        label,
        field,
        conversion: Conversion::Measure(kind),
    }
}

pub static DOWNSTREAM: ReportSpec = ReportSpec {
    event_name: "downstream_channels",
    fields: &[
        text("Modulation", "modulation"),
        text("Lock Status", "lock_status"),
        measure("Frequency", "frequency", FieldKind::Frequency),
        measure("SNR", "snr", FieldKind::Snr),
        measure("Power Level", "power_level", FieldKind::PowerLevel),
    ],
};

pub static UPSTREAM: ReportSpec = ReportSpec {
    event_name: "upstream_channels",
    fields: &[
        text("Modulation", "modulation"),
        text("Lock Status", "lock_status"),
        text("Channel Type", "channel_type"),
        measure("Frequency", "frequency", FieldKind::Frequency),
        measure("Symbol Rate", "symbol_rate", FieldKind::Count),
        measure("Power Level", "power_level", FieldKind::PowerLevel),
    ],
};

pub static CODEWORDS: ReportSpec = ReportSpec {
    event_name: "cm_codewords",
    fields: &[
        measure("Unerrored Codewords", "unerrored_codewords", FieldKind::Count),
        measure("Correctable Codewords", "correctable_codewords", FieldKind::Count),
        measure(
            "Uncorrectable Codewords",
            "uncorrectable_codewords",
            FieldKind::Count,
        ),
    ],
};
