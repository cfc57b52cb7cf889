//! SQL schema for the survey warehouse.
//!
//! [`SCHEMA`] is applied explicitly (the `init` step); opening a warehouse
//! never creates tables, so a missing table is reported rather than papered
//! over. [`CONNECTION_PRAGMAS`] run on every connection.

/// Per-connection settings.
pub const CONNECTION_PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
";

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Dimension identities are plain `INTEGER PRIMARY KEY` rowids, so emptying
/// a dimension restarts its keys at 1.
pub const SCHEMA: &str = "
-- Cleaned survey rows, one column per input column.
CREATE TABLE IF NOT EXISTS mental_health_staging (
    id_staging              INTEGER PRIMARY KEY,
    Timestamp               TEXT,
    Gender                  TEXT,
    Country                 TEXT,
    Occupation              TEXT,
    self_employed           TEXT,
    family_history          TEXT,
    treatment               TEXT,
    Days_Indoors            TEXT,
    Growing_Stress          TEXT,
    Changes_Habits          TEXT,
    Mental_Health_History   TEXT,
    Mood_Swings             TEXT,
    Coping_Struggles        TEXT,
    Work_Interest           TEXT,
    Social_Weakness         TEXT,
    mental_health_interview TEXT,
    care_options            TEXT
);

CREATE TABLE IF NOT EXISTS Dim_Tiempo (
    id_tiempo  INTEGER PRIMARY KEY,
    anio       INTEGER NOT NULL,
    mes        INTEGER NOT NULL CHECK (mes BETWEEN 1 AND 12),
    nombre_mes TEXT    NOT NULL,
    periodo    TEXT    NOT NULL,   -- 'YYYY-MM'
    trimestre  INTEGER NOT NULL CHECK (trimestre BETWEEN 1 AND 4),
    semestre   INTEGER NOT NULL CHECK (semestre IN (1, 2)),
    UNIQUE (anio, mes)
);

CREATE TABLE IF NOT EXISTS Dim_Genero (
    id_genero   INTEGER PRIMARY KEY,
    genero      TEXT NOT NULL UNIQUE,
    descripcion TEXT
);

CREATE TABLE IF NOT EXISTS Dim_Historial (
    id_historial   INTEGER PRIMARY KEY,
    family_history TEXT NOT NULL UNIQUE,
    descripcion    TEXT
);

CREATE TABLE IF NOT EXISTS Dim_Ocupacion (
    id_ocupacion INTEGER PRIMARY KEY,
    occupation   TEXT NOT NULL UNIQUE,
    descripcion  TEXT
);

CREATE TABLE IF NOT EXISTS Dim_Pais (
    id_pais    INTEGER PRIMARY KEY,
    country    TEXT NOT NULL UNIQUE,
    region     TEXT NOT NULL,
    codigo_iso TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS Dim_Aislamiento (
    id_aislamiento INTEGER PRIMARY KEY,
    days_indoors   TEXT    NOT NULL UNIQUE,
    orden          INTEGER NOT NULL,
    categoria      TEXT    NOT NULL   -- 'Bajo' | 'Medio' | 'Alto'
);

CREATE TABLE IF NOT EXISTS Dim_Sintomas (
    id_sintomas               INTEGER PRIMARY KEY,
    growing_stress            TEXT    NOT NULL,
    mood_swings               TEXT    NOT NULL,
    coping_struggles          TEXT    NOT NULL,
    social_weakness           TEXT    NOT NULL,
    indicador_inferido_estres INTEGER NOT NULL CHECK (indicador_inferido_estres IN (0, 1)),
    UNIQUE (growing_stress, mood_swings, coping_struggles, social_weakness)
);

CREATE TABLE IF NOT EXISTS Dim_Acceso (
    id_acceso               INTEGER PRIMARY KEY,
    care_options            TEXT NOT NULL,
    mental_health_interview TEXT NOT NULL,
    UNIQUE (care_options, mental_health_interview)
);

-- One row per distinct combination of dimension keys.
CREATE TABLE IF NOT EXISTS Hechos_Estres_SaludMental (
    id_hecho       INTEGER PRIMARY KEY,
    id_tiempo      INTEGER NOT NULL REFERENCES Dim_Tiempo(id_tiempo),
    id_genero      INTEGER NOT NULL REFERENCES Dim_Genero(id_genero),
    id_historial   INTEGER NOT NULL REFERENCES Dim_Historial(id_historial),
    id_ocupacion   INTEGER NOT NULL REFERENCES Dim_Ocupacion(id_ocupacion),
    id_pais        INTEGER NOT NULL REFERENCES Dim_Pais(id_pais),
    id_aislamiento INTEGER NOT NULL REFERENCES Dim_Aislamiento(id_aislamiento),
    id_sintomas    INTEGER NOT NULL REFERENCES Dim_Sintomas(id_sintomas),
    id_acceso      INTEGER NOT NULL REFERENCES Dim_Acceso(id_acceso),

    cantidad_estres                           INTEGER NOT NULL,
    porcentaje_estres                         REAL,
    cantidad_historial_estres                 INTEGER NOT NULL,
    porcentaje_historial_estres               REAL,
    cantidad_estres_afrontamiento             INTEGER NOT NULL,
    porcentaje_estres_afrontamiento_ocupacion REAL,
    porcentaje_tratamiento                    REAL,
    porcentaje_no_tratamiento                 REAL,
    cantidad_tratamiento                      INTEGER NOT NULL,
    porcentaje_deterioro_aislamiento          REAL,
    porcentaje_humor_aislamiento              REAL,
    porcentaje_debilidad_aislamiento          REAL,
    porcentaje_acceso_recursos                REAL,
    cantidad_estres_acceso                    INTEGER NOT NULL,
    porcentaje_sintomas_no_reconocidos        REAL,
    porcentaje_recursos_sin_tratamiento       REAL,
    porcentaje_postergacion                   REAL,

    UNIQUE (id_tiempo, id_genero, id_historial, id_ocupacion,
            id_pais, id_aislamiento, id_sintomas, id_acceso)
);

CREATE INDEX IF NOT EXISTS staging_country_idx ON mental_health_staging(Country);
CREATE INDEX IF NOT EXISTS hechos_pais_idx     ON Hechos_Estres_SaludMental(id_pais);
CREATE INDEX IF NOT EXISTS hechos_genero_idx   ON Hechos_Estres_SaludMental(id_genero);

PRAGMA user_version = 1;
";

pub const INSERT_STAGING: &str = "
INSERT INTO mental_health_staging (
    Timestamp, Gender, Country, Occupation, self_employed,
    family_history, treatment, Days_Indoors, Growing_Stress,
    Changes_Habits, Mental_Health_History, Mood_Swings,
    Coping_Struggles, Work_Interest, Social_Weakness,
    mental_health_interview, care_options
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)";

pub const SELECT_STAGING: &str = "
SELECT
    Timestamp, Gender, Country, Occupation, self_employed,
    family_history, treatment, Days_Indoors, Growing_Stress,
    Changes_Habits, Mental_Health_History, Mood_Swings,
    Coping_Struggles, Work_Interest, Social_Weakness,
    mental_health_interview, care_options
FROM mental_health_staging
ORDER BY id_staging";

pub const INSERT_FACT: &str = "
INSERT INTO Hechos_Estres_SaludMental (
    id_tiempo, id_genero, id_historial, id_ocupacion, id_pais,
    id_aislamiento, id_sintomas, id_acceso,
    cantidad_estres, porcentaje_estres,
    cantidad_historial_estres, porcentaje_historial_estres,
    cantidad_estres_afrontamiento, porcentaje_estres_afrontamiento_ocupacion,
    porcentaje_tratamiento, porcentaje_no_tratamiento, cantidad_tratamiento,
    porcentaje_deterioro_aislamiento, porcentaje_humor_aislamiento,
    porcentaje_debilidad_aislamiento, porcentaje_acceso_recursos,
    cantidad_estres_acceso, porcentaje_sintomas_no_reconocidos,
    porcentaje_recursos_sin_tratamiento, porcentaje_postergacion
) VALUES (
    ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8,
    ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
    ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25
)";

pub const SELECT_EXPORT: &str = "
SELECT
    dt.anio, dt.mes, dt.nombre_mes, dt.periodo, dt.trimestre, dt.semestre,
    dg.genero,
    dh.family_history,
    dox.occupation,
    dp.country, dp.region,
    da.days_indoors, da.categoria, da.orden,
    ds.growing_stress, ds.mood_swings, ds.coping_struggles, ds.social_weakness,
    ds.indicador_inferido_estres,
    dac.care_options, dac.mental_health_interview,
    h.cantidad_estres, h.porcentaje_estres,
    h.cantidad_historial_estres, h.porcentaje_historial_estres,
    h.cantidad_estres_afrontamiento, h.porcentaje_estres_afrontamiento_ocupacion,
    h.porcentaje_tratamiento, h.porcentaje_no_tratamiento, h.cantidad_tratamiento,
    h.porcentaje_deterioro_aislamiento, h.porcentaje_humor_aislamiento,
    h.porcentaje_debilidad_aislamiento, h.porcentaje_acceso_recursos,
    h.cantidad_estres_acceso, h.porcentaje_sintomas_no_reconocidos,
    h.porcentaje_recursos_sin_tratamiento, h.porcentaje_postergacion
FROM Hechos_Estres_SaludMental h
INNER JOIN Dim_Tiempo      dt  ON h.id_tiempo      = dt.id_tiempo
INNER JOIN Dim_Genero      dg  ON h.id_genero      = dg.id_genero
INNER JOIN Dim_Historial   dh  ON h.id_historial   = dh.id_historial
INNER JOIN Dim_Ocupacion   dox ON h.id_ocupacion   = dox.id_ocupacion
INNER JOIN Dim_Pais        dp  ON h.id_pais        = dp.id_pais
INNER JOIN Dim_Aislamiento da  ON h.id_aislamiento = da.id_aislamiento
INNER JOIN Dim_Sintomas    ds  ON h.id_sintomas    = ds.id_sintomas
INNER JOIN Dim_Acceso      dac ON h.id_acceso      = dac.id_acceso
ORDER BY dt.anio, dt.mes, dg.genero, dp.country";
