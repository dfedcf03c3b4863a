pub(crate) mod provenance;
