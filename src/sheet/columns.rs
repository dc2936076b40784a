//! Logical columns of the published list and their known header spellings

/// Target attribute of a [`MedicationRecord`](crate::types::MedicationRecord)
/// read from one sheet column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    DiseaseGroup,
    InternationalCode,
    InternationalName,
    Dose,
    CommercialCode,
    CompensationAmountWithTax,
    CompensationAmountWithoutTax,
    CommercialName,
    PharmaceuticalForm,
    PackSize,
    Country,
    Manufacturer,
    RegistrationNumber,
    RegistrationDate,
    AtcCode,
    MedicationCode,
    PriceApprovalDate,
}

impl Field {
    pub const ALL: [Field; 17] = [
        Field::DiseaseGroup,
        Field::InternationalCode,
        Field::InternationalName,
        Field::Dose,
        Field::CommercialCode,
        Field::CompensationAmountWithTax,
        Field::CompensationAmountWithoutTax,
        Field::CommercialName,
        Field::PharmaceuticalForm,
        Field::PackSize,
        Field::Country,
        Field::Manufacturer,
        Field::RegistrationNumber,
        Field::RegistrationDate,
        Field::AtcCode,
        Field::MedicationCode,
        Field::PriceApprovalDate,
    ];

    /// Header labels for this column, canonical spelling first.
    ///
    /// The publisher alternates between cedilla and comma-below diacritics
    /// and sometimes drops diacritics altogether.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::DiseaseGroup => &[
                "Grupa maladiilor pentru compensare",
                "Grupa maladiilor",
            ],
            Self::InternationalCode => &["Cod DCI"],
            Self::InternationalName => &[
                "Denumirea Comuna Internationala (DCI)",
                "Denumirea Comună Internațională (DCI)",
                "Denumirea Comună Internaţională (DCI)",
                "DCI",
            ],
            Self::Dose => &["Doza în SI MC", "Doza in SI MC", "Doza"],
            Self::CommercialCode => &["Cod DC"],
            Self::CompensationAmountWithTax => &[
                "Suma fixă compensată per unitate de măsură inclusiv TVA",
                "Suma fixa compensata per unitate de masura inclusiv TVA",
            ],
            Self::CompensationAmountWithoutTax => &[
                "Suma fixă compensată per unitate de măsură fără TVA",
                "Suma fixa compensata per unitate de masura fara TVA",
            ],
            Self::CommercialName => &["Denumirea comercială (DC)", "Denumirea comerciala (DC)"],
            Self::PharmaceuticalForm => &["Forma farmaceutică", "Forma farmaceutica"],
            Self::PackSize => &["Divizarea"],
            Self::Country => &["Ţara", "Țara", "Tara"],
            Self::Manufacturer => &["Firma producătoare", "Firma producatoare"],
            Self::RegistrationNumber => &[
                "Număr de înregistrare",
                "Numărul de înregistrare",
                "Numar de inregistrare",
            ],
            Self::RegistrationDate => &["Data înregistrării", "Data inregistrarii"],
            Self::AtcCode => &["Cod ATC"],
            Self::MedicationCode => &[
                "Cod medicament (Catalogul național de prețuri)",
                "Cod medicament (Catalogul naţional de preţuri)",
                "Cod medicament",
            ],
            Self::PriceApprovalDate => &[
                "Data aprobării preţului de Agenția Medicamentului și Dispozitivelor medicale",
                "Data aprobării prețului de Agenția Medicamentului și Dispozitivelor Medicale",
                "Data aprobării preţului",
            ],
        }
    }

    /// Canonical header label
    pub fn label(&self) -> &'static str {
        self.aliases()[0]
    }
}
