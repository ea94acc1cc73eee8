//! Static channel registry: one table-driven definition per physical sensor,
//! consumed by the decoder, the store, and the aggregation endpoints.

/// SenseCAP measurement ids used by keyed payloads.
pub const MEASUREMENT_ID_TEMPERATURE: i64 = 4097;
pub const MEASUREMENT_ID_HUMIDITY: i64 = 4098;
pub const MEASUREMENT_ID_CO2: i64 = 4100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Light,
    Environment,
    Soil,
}

/// One numeric measurement slot of a channel, in storage/response order.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// JSON key in read responses (`value`, `valueCO2`, ...).
    pub key: &'static str,
    /// Column name in the channel table.
    pub column: &'static str,
    /// Short suffix used by the pic-average response; empty for
    /// single-field channels.
    pub label: &'static str,
}

/// How uplink payload entries map onto a channel's fields.
#[derive(Debug, Clone, Copy)]
pub enum DecodeMode {
    /// The N-th payload entry feeds field `order[N]`. The soil probes report
    /// `[temperature, soil moisture, conductivity]` while storage order is
    /// `(valueSM, valueTemp, valueEC)`, hence the non-identity orders below.
    Positional { order: &'static [usize] },
    /// Entries carry a `measurementId`; assignment ignores array position.
    Keyed { ids: &'static [(i64, usize)] },
}

#[derive(Debug)]
pub struct ChannelDef {
    /// URL path segment, also the table name.
    pub slug: &'static str,
    pub kind: ChannelKind,
    pub decode: DecodeMode,
    pub fields: &'static [FieldSpec],
}

impl ChannelDef {
    pub fn table(&self) -> &'static str {
        self.slug
    }
}

const LIGHT_FIELDS: &[FieldSpec] = &[FieldSpec {
    key: "value",
    column: "value",
    label: "",
}];

const ENV_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        key: "valueCO2",
        column: "value_co2",
        label: "CO2",
    },
    FieldSpec {
        key: "valueTemp",
        column: "value_temp",
        label: "Temp",
    },
    FieldSpec {
        key: "valueHum",
        column: "value_hum",
        label: "Hum",
    },
];

const SOIL_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        key: "valueSM",
        column: "value_sm",
        label: "SM",
    },
    FieldSpec {
        key: "valueTemp",
        column: "value_temp",
        label: "Temp",
    },
    FieldSpec {
        key: "valueEC",
        column: "value_ec",
        label: "EC",
    },
];

const LIGHT_DECODE: DecodeMode = DecodeMode::Positional { order: &[0] };
const SOIL_DECODE: DecodeMode = DecodeMode::Positional { order: &[1, 0, 2] };
const ENV_DECODE: DecodeMode = DecodeMode::Keyed {
    ids: &[
        (MEASUREMENT_ID_CO2, 0),
        (MEASUREMENT_ID_TEMPERATURE, 1),
        (MEASUREMENT_ID_HUMIDITY, 2),
    ],
};

pub static LIGHT_EXT: ChannelDef = ChannelDef {
    slug: "sensor_light_ext",
    kind: ChannelKind::Light,
    decode: LIGHT_DECODE,
    fields: LIGHT_FIELDS,
};

pub static LIGHT_INT: ChannelDef = ChannelDef {
    slug: "sensor_light_int",
    kind: ChannelKind::Light,
    decode: LIGHT_DECODE,
    fields: LIGHT_FIELDS,
};

pub static ENV_EXT: ChannelDef = ChannelDef {
    slug: "sensor_co2temphum_ext",
    kind: ChannelKind::Environment,
    decode: ENV_DECODE,
    fields: ENV_FIELDS,
};

pub static ENV_INT: ChannelDef = ChannelDef {
    slug: "sensor_co2temphum_int",
    kind: ChannelKind::Environment,
    decode: ENV_DECODE,
    fields: ENV_FIELDS,
};

pub static SOIL_1: ChannelDef = ChannelDef {
    slug: "sensor_smtempec_1",
    kind: ChannelKind::Soil,
    decode: SOIL_DECODE,
    fields: SOIL_FIELDS,
};

pub static SOIL_2: ChannelDef = ChannelDef {
    slug: "sensor_smtempec_2",
    kind: ChannelKind::Soil,
    decode: SOIL_DECODE,
    fields: SOIL_FIELDS,
};

pub static SOIL_3: ChannelDef = ChannelDef {
    slug: "sensor_smtempec_3",
    kind: ChannelKind::Soil,
    decode: SOIL_DECODE,
    fields: SOIL_FIELDS,
};

pub static SOIL_4: ChannelDef = ChannelDef {
    slug: "sensor_smtempec_4",
    kind: ChannelKind::Soil,
    decode: SOIL_DECODE,
    fields: SOIL_FIELDS,
};

pub static CHANNELS: &[&ChannelDef] = &[
    &LIGHT_EXT, &LIGHT_INT, &ENV_EXT, &ENV_INT, &SOIL_1, &SOIL_2, &SOIL_3, &SOIL_4,
];

/// Static device mapping, loaded once, immutable. Device EUIs come from the
/// TTN application registration.
static DEVICES: &[(&str, &ChannelDef)] = &[
    ("eui-2cf7f1c04430094f", &LIGHT_EXT),
    ("eui-2cf7f1c044300975", &LIGHT_INT),
    ("eui-2cf7f1c044300436", &ENV_EXT),
    ("eui-2cf7f1c0443004b1", &ENV_INT),
    ("eui-2cf7f1c0435006c8", &SOIL_1),
    ("eui-2cf7f1c043500707", &SOIL_2),
    ("eui-2cf7f1c043500681", &SOIL_3),
    ("eui-2cf7f1c0435005e6", &SOIL_4),
];

pub fn by_slug(slug: &str) -> Option<&'static ChannelDef> {
    CHANNELS
        .iter()
        .find(|channel| channel.slug == slug)
        .copied()
}

pub fn for_device(device_id: &str) -> Option<&'static ChannelDef> {
    DEVICES
        .iter()
        .find(|(id, _)| *id == device_id)
        .map(|(_, channel)| *channel)
}
