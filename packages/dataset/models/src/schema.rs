//! Column names for each layer.
//!
//! Source datasets keep their original (Portuguese) headers. The loader
//! derives a few extra columns (prefixed constants marked *derived*) so the
//! aggregator can read them directly.

use crate::CellValue;

/// Questionnaire code meaning "not applicable / not reported". Counts as
/// zero in every sum.
pub const SENTINEL_NOT_APPLICABLE: f64 = 88_888.0;

/// Label used for the bucket that absorbs empty and "other" categories.
pub const OTHERS_LABEL: &str = "Outros";

/// Companies (RAIS + Receita Federal, georeferenced).
pub mod company {
    /// Latitude column.
    pub const LATITUDE: &str = "latitude";
    /// Longitude column.
    pub const LONGITUDE: &str = "longitude";
    /// CNAE section (sector).
    pub const SECTOR: &str = "Seção";
    /// CNAE denomination (subsector).
    pub const SUBSECTOR: &str = "Denominação";
    /// Registration status (`Ativa`, `Baixada`, ...).
    pub const STATUS: &str = "situacao_cadastral_desc";
    /// Employee headcount.
    pub const EMPLOYEES: &str = "Empregados";
    /// Total payroll.
    pub const PAYROLL: &str = "Massa_Salarial";
    /// Average salary.
    pub const MEAN_SALARY: &str = "MédiaSalarial";
    /// Status kept when no status filter is given.
    pub const DEFAULT_STATUS: &str = "Ativa";
    /// Columns that must exist in the table.
    pub const REQUIRED: &[&str] = &[LATITUDE, LONGITUDE];
}

/// CNES health establishments.
pub mod health {
    /// Latitude column.
    pub const LATITUDE: &str = "Latitude";
    /// Longitude column.
    pub const LONGITUDE: &str = "Longitude";
    /// Establishment type code.
    pub const ESTABLISHMENT_TYPE: &str = "CO_TIPO_ESTABELECIMENTO";
    /// Trade name.
    pub const NAME: &str = "NO_FANTASIA";
    /// Neighborhood.
    pub const NEIGHBORHOOD: &str = "NO_BAIRRO";
    /// Street.
    pub const STREET: &str = "NO_LOGRADOURO";
    /// Street number.
    pub const NUMBER: &str = "NU_ENDERECO";
    /// Columns that must exist in the table.
    pub const REQUIRED: &[&str] = &[
        "CO_UNIDADE",
        "CO_CNES",
        "NU_CNPJ_MANTENEDORA",
        "TP_PFPJ",
        "NIVEL_DEP",
        "NO_RAZAO_SOCIAL",
        NAME,
        STREET,
        NUMBER,
        "NO_COMPLEMENTO",
        NEIGHBORHOOD,
        "CO_CEP",
        "CO_MUNICIPIO_GESTOR",
        LATITUDE,
        LONGITUDE,
        ESTABLISHMENT_TYPE,
    ];
}

/// INEP school census.
pub mod school {
    /// Latitude column.
    pub const LATITUDE: &str = "Latitude";
    /// Longitude column.
    pub const LONGITUDE: &str = "Longitude";
    /// School name.
    pub const NAME: &str = "NO_ENTIDADE";
    /// Administrative dependency code (1-4).
    pub const DEPENDENCY: &str = "TP_DEPENDENCIA";
    /// *Derived*: dependency display label.
    pub const DEPENDENCY_LABEL: &str = "DEP_LABEL";
    /// *Derived*: staff headcount (sum of [`STAFF`]).
    pub const STAFF_TOTAL: &str = "QT_FUNCIONARIOS";
    /// Basic education enrollment.
    pub const ENROLLMENT_BASIC: &str = "QT_MAT_BAS";
    /// Technical / professional enrollment.
    pub const ENROLLMENT_TECHNICAL: &str = "QT_MAT_PROF";

    /// Columns that must exist in the table.
    pub const REQUIRED: &[&str] = &[LATITUDE, LONGITUDE, NAME, DEPENDENCY];

    /// Canonical display order for dependency labels.
    pub const DEPENDENCY_ORDER: &[&str] = &["Federal", "Estadual", "Municipal", "Privada"];

    /// Early childhood enrollment columns.
    pub const ENROLLMENT_INFANT: &[&str] = &["QT_MAT_INF", "QT_MAT_INF_CRE", "QT_MAT_INF_PRE"];

    /// Elementary enrollment columns.
    pub const ENROLLMENT_ELEMENTARY: &[&str] = &[
        "QT_MAT_FUND",
        "QT_MAT_FUND_AI",
        "QT_MAT_FUND_AI_1",
        "QT_MAT_FUND_AI_2",
        "QT_MAT_FUND_AI_3",
        "QT_MAT_FUND_AI_4",
        "QT_MAT_FUND_AI_5",
        "QT_MAT_FUND_AF",
        "QT_MAT_FUND_AF_6",
        "QT_MAT_FUND_AF_7",
        "QT_MAT_FUND_AF_8",
        "QT_MAT_FUND_AF_9",
    ];

    /// High school enrollment columns.
    pub const ENROLLMENT_HIGH_SCHOOL: &[&str] = &[
        "QT_MAT_MED",
        "QT_MAT_MED_PROP",
        "QT_MAT_MED_PROP_1",
        "QT_MAT_MED_PROP_2",
        "QT_MAT_MED_PROP_3",
        "QT_MAT_MED_PROP_4",
        "QT_MAT_MED_PROP_NS",
        "QT_MAT_MED_CT",
        "QT_MAT_MED_CT_1",
        "QT_MAT_MED_CT_2",
        "QT_MAT_MED_CT_3",
        "QT_MAT_MED_CT_4",
        "QT_MAT_MED_CT_NS",
        "QT_MAT_MED_NM",
        "QT_MAT_MED_NM_1",
        "QT_MAT_MED_NM_2",
        "QT_MAT_MED_NM_3",
        "QT_MAT_MED_NM_4",
    ];

    /// Staff sub-role columns. Their sum is the school's headcount.
    pub const STAFF: &[&str] = &[
        "QT_PROF_ADMINISTRATIVOS",
        "QT_PROF_SERVICOS_GERAIS",
        "QT_PROF_BIBLIOTECARIO",
        "QT_PROF_SAUDE",
        "QT_PROF_COORDENADOR",
        "QT_PROF_FONAUDIOLOGO",
        "QT_PROF_NUTRICIONISTA",
        "QT_PROF_PSICOLOGO",
        "QT_PROF_ALIMENTACAO",
        "QT_PROF_PEDAGOGIA",
        "QT_PROF_SECRETARIO",
        "QT_PROF_SEGURANCA",
        "QT_PROF_MONITORES",
        "QT_PROF_GESTAO",
        "QT_PROF_ASSIST_SOCIAL",
        "QT_PROF_TRAD_LIBRAS",
        "QT_PROF_AGRICOLA",
        "QT_PROF_REVISOR_BRAILLE",
    ];
}

/// Public buildings and security posts share the same sheet layout.
pub mod building {
    /// Latitude column.
    pub const LATITUDE: &str = "Latitude";
    /// Longitude column.
    pub const LONGITUDE: &str = "Longitude";
    /// Building name.
    pub const NAME: &str = "Nome";
    /// Building type.
    pub const KIND: &str = "Tipo";
    /// Address.
    pub const ADDRESS: &str = "Endereço";
    /// Columns that must exist in the table.
    pub const REQUIRED: &[&str] = &[NAME, LATITUDE, LONGITUDE];
}

/// Street segments.
pub mod street {
    /// Street type (Rua, Avenida, ...).
    pub const KIND: &str = "tipo";
    /// Street name.
    pub const NAME: &str = "nome";
    /// Drainage flag.
    pub const DRAINAGE: &str = "drenagem";
    /// Lighting flag.
    pub const LIGHTING: &str = "iluminacao";
    /// *Derived*: street identity (`tipo nome`, or the row index).
    pub const STREET_ID: &str = "_rua_id_interno";
}

/// Land parcels.
pub mod parcel {
    /// Water supply flag.
    pub const WATER: &str = "agua";
    /// Garbage collection flag.
    pub const GARBAGE: &str = "coleta_lix";
    /// Storm sewer flag.
    pub const STORM_SEWER: &str = "esgoto_plu";
    /// Condominium flag.
    pub const CONDOMINIUM: &str = "condominio";
    /// Sewage kind.
    pub const SEWAGE: &str = "esgoto_clo";
    /// [`SEWAGE`] value for a sewer connection.
    pub const SEWAGE_NETWORK: &str = "esgoto_cloacal";
    /// [`SEWAGE`] value for a septic tank.
    pub const SEWAGE_SEPTIC: &str = "fossa_septica";
    /// Lot area in square meters.
    pub const LOT_AREA: &str = "area_lote";
}

/// Real-estate cadastre.
pub mod real_estate {
    /// Land use.
    pub const USE: &str = "Uso";
    /// Ownership (public/private heritage).
    pub const OWNERSHIP: &str = "Patrim";
    /// Condominium flag (`1`).
    pub const CONDOMINIUM: &str = "Condom";
    /// EPSG code assumed when the cadastre declares none (SIRGAS 2000 / UTM 22S).
    pub const DEFAULT_EPSG: u32 = 31_982;
}

/// Maps a `TP_DEPENDENCIA` cell to its display label
/// (`1` Federal, `2` Estadual, `3` Municipal, `4` Privada). Unknown codes
/// and text are returned as-is.
#[must_use]
pub fn dependency_label(cell: &CellValue) -> String {
    #[allow(clippy::cast_possible_truncation)]
    let code = cell.as_f64().filter(|v| v.fract() == 0.0).map(|v| v as i64);

    match code {
        Some(1) => "Federal".to_string(),
        Some(2) => "Estadual".to_string(),
        Some(3) => "Municipal".to_string(),
        Some(4) => "Privada".to_string(),
        _ => cell
            .as_text()
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}
