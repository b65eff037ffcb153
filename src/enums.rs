use serde::{Deserialize, Serialize};

/// Canonical domain vocabulary shared by the normalizers, the table
/// descriptors and the validation engine. Every enum exposes its
/// snake_case token; matching is by token equality after the raw cell
/// has been canonicalized (see `normalize::match_token`).
pub trait DomainEnum: Sized + Copy + 'static {
    fn variants() -> &'static [Self];
    fn token(self) -> &'static str;

    fn from_token(token: &str) -> Option<Self> {
        Self::variants().iter().copied().find(|v| v.token() == token)
    }

    /// Token list used as the `options` set of `select`/`multiselect`
    /// descriptor columns.
    fn tokens() -> Vec<String> {
        Self::variants()
            .iter()
            .map(|v| v.token().to_string())
            .collect()
    }
}

macro_rules! domain_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $token:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl DomainEnum for $name {
            fn variants() -> &'static [Self] {
                &[$(Self::$variant),+]
            }

            fn token(self) -> &'static str {
                match self {
                    $(Self::$variant => $token),+
                }
            }
        }
    };
}

domain_enum! {
    Sector {
        Renewables => "renewables",
        ThermalPower => "thermal_power",
        TransmissionDistribution => "transmission_distribution",
        EnergyStorage => "energy_storage",
        Hydrogen => "hydrogen",
        Biofuels => "biofuels",
        OilAndGas => "oil_and_gas",
        Water => "water",
        WasteToEnergy => "waste_to_energy",
        DigitalInfrastructure => "digital_infrastructure",
    }
}

domain_enum! {
    Technology {
        Photovoltaic => "photovoltaic",
        SolarThermal => "solar_thermal",
        OnshoreWind => "onshore_wind",
        OffshoreWind => "offshore_wind",
        Hydroelectric => "hydroelectric",
        PumpedStorage => "pumped_storage",
        Geothermal => "geothermal",
        Biomass => "biomass",
        BatteryStorage => "battery_storage",
        GreenHydrogen => "green_hydrogen",
        NaturalGas => "natural_gas",
        Coal => "coal",
        Nuclear => "nuclear",
    }
}

domain_enum! {
    ProjectStage {
        InDevelopment => "in_development",
        ReadyToBuild => "ready_to_build",
        UnderConstruction => "under_construction",
        Operational => "operational",
        Decommissioned => "decommissioned",
    }
}

domain_enum! {
    CompanyClassification {
        IndependentPowerProducer => "independent_power_producer",
        Utility => "utility",
        Developer => "developer",
        InvestmentFund => "investment_fund",
        Bank => "bank",
        OilMajor => "oil_major",
        EpcContractor => "epc_contractor",
        Government => "government",
        Insurer => "insurer",
    }
}

domain_enum! {
    /// Role a company plays on a deal or project relationship row.
    CompanyRole {
        Buyer => "buyer",
        Seller => "seller",
        Target => "target",
        Advisor => "advisor",
        Sponsor => "sponsor",
        Lender => "lender",
        Borrower => "borrower",
        Offtaker => "offtaker",
        Partner => "partner",
        Developer => "developer",
        Operator => "operator",
    }
}

domain_enum! {
    /// Per-row subtype discriminator across all deal families. An
    /// unrecognized discriminator leaves the deal row in place with no
    /// subtype rather than dropping it.
    DealSubtype {
        MaAsset => "ma_asset",
        MaCorporate => "ma_corporate",
        Debt => "debt",
        Equity => "equity",
        Refinancing => "refinancing",
        GreenBond => "green_bond",
        Ppa => "ppa",
        JointVenture => "joint_venture",
        ProjectUpdate => "project_update",
    }
}

domain_enum! {
    RevenueModel {
        PowerPurchaseAgreement => "power_purchase_agreement",
        Merchant => "merchant",
        ContractForDifference => "contract_for_difference",
        FeedInTariff => "feed_in_tariff",
        TollingAgreement => "tolling_agreement",
    }
}

domain_enum! {
    /// ISO-3166 alpha-2 codes for the markets the platform tracks.
    /// Stored lowercase; free-text country names resolve through
    /// `normalize::resolve_country`.
    CountryCode {
        Ae => "ae", Ar => "ar", At => "at", Au => "au", Be => "be",
        Br => "br", Ca => "ca", Ch => "ch", Cl => "cl", Cn => "cn",
        Co => "co", Cz => "cz", De => "de", Dk => "dk", Eg => "eg",
        Es => "es", Fi => "fi", Fr => "fr", Gb => "gb", Gr => "gr",
        Id => "id", Ie => "ie", Il => "il", In => "in", It => "it",
        Jp => "jp", Ke => "ke", Kr => "kr", Ma => "ma", Mx => "mx",
        Ng => "ng", Nl => "nl", No => "no", Nz => "nz", Pe => "pe",
        Ph => "ph", Pl => "pl", Pt => "pt", Ro => "ro", Sa => "sa",
        Se => "se", Sg => "sg", Th => "th", Tr => "tr", Tw => "tw",
        Ua => "ua", Us => "us", Uy => "uy", Vn => "vn", Za => "za",
        Zm => "zm",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip() {
        for stage in ProjectStage::variants() {
            assert_eq!(ProjectStage::from_token(stage.token()), Some(*stage));
        }
        assert_eq!(ProjectStage::from_token("bogus_value"), None);
    }

    #[test]
    fn test_serde_matches_token() {
        let json = serde_json::to_string(&Technology::OnshoreWind).unwrap();
        assert_eq!(json, "\"onshore_wind\"");
        let json = serde_json::to_string(&DealSubtype::MaCorporate).unwrap();
        assert_eq!(json, "\"ma_corporate\"");
    }

    #[test]
    fn test_tokens_list() {
        let tokens = RevenueModel::tokens();
        assert!(tokens.contains(&"feed_in_tariff".to_string()));
        assert_eq!(tokens.len(), RevenueModel::variants().len());
    }
}
