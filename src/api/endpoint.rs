pub type Endpoint = str;

pub const STATIONS: &Endpoint = "/stations";
