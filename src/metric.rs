use std::fmt;

use serde::{Deserialize, Serialize};

use crate::process::years_descending;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Metric {
    HomeownershipRate,
    RentalVacancyRate,
    HomeownerVacancyRate,
}

impl Metric {
    pub const ALL: [Metric; 3] = [
        Metric::HomeownershipRate,
        Metric::RentalVacancyRate,
        Metric::HomeownerVacancyRate,
    ];

    pub fn spec(&self) -> &'static MetricSpec {
        match self {
            Metric::HomeownershipRate => &HOMEOWNERSHIP,
            Metric::RentalVacancyRate => &RENTAL_VACANCY,
            Metric::HomeownerVacancyRate => &HOMEOWNER_VACANCY,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::HomeownershipRate => "homeownership-rate",
            Metric::RentalVacancyRate => "rental-vacancy-rate",
            Metric::HomeownerVacancyRate => "homeowner-vacancy-rate",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two source vintages, which differ in layout and area vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Era {
    /// 2005–2014 tables, pre-2013 area names.
    Early,
    /// 2015–2018 tables, post-2013 area names.
    Late,
}

impl Era {
    pub const ALL: [Era; 2] = [Era::Early, Era::Late];

    pub fn first_year(&self) -> i32 {
        match self {
            Era::Early => 2005,
            Era::Late => 2015,
        }
    }

    pub fn last_year(&self) -> i32 {
        match self {
            Era::Early => 2014,
            Era::Late => 2018,
        }
    }

    /// Years in the order the era's tables list them (most recent first).
    pub fn years(&self) -> Vec<i32> {
        years_descending(self.first_year(), self.last_year())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Era::Early => "early",
            Era::Late => "late",
        }
    }
}

/// Static parameters of one metric's pipeline.
#[derive(Debug)]
pub struct MetricSpec {
    pub early_source: &'static str,
    pub late_source: &'static str,
    /// Header of the value column in the output table.
    pub value_field: &'static str,
    /// Output file name without extension.
    pub output_stem: &'static str,
}

impl MetricSpec {
    pub fn source(&self, era: Era) -> &'static str {
        match era {
            Era::Early => self.early_source,
            Era::Late => self.late_source,
        }
    }
}

static HOMEOWNERSHIP: MetricSpec = MetricSpec {
    early_source: "tab6a_msa_05_2014_hmr",
    late_source: "tab6_msa_15_18_hmr",
    value_field: "HomeOwnershipRate",
    output_stem: "Census_HomeownershipRate",
};

static RENTAL_VACANCY: MetricSpec = MetricSpec {
    early_source: "tab4a_msa_05_2014_rvr",
    late_source: "tab4_msa_15_18_rvr",
    value_field: "RentalVacancyRate",
    output_stem: "Census_RentalVacancyRate",
};

static HOMEOWNER_VACANCY: MetricSpec = MetricSpec {
    early_source: "tab5a_msa_05_2014_hvr",
    late_source: "tab5_msa_15_18_hvr",
    value_field: "HomeownerVacancyRate",
    output_stem: "Census_HomeownerVacancyRate",
};
