/*Resultado del fsck. Los errores son inconsistencias reales (bloques
compartidos, cadenas rotas, entradas huérfanas); las advertencias son cosas
que no rompen nada, como bloques reservados que nadie referencia. */

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsckReport {
    pub blocks_ok: bool,
    pub entries_ok: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Entradas en uso revisadas.
    pub live_entries: u32,
    /// Bloques de datos que pertenecen a alguna cadena viva.
    pub used_blocks: u32,
}

impl FsckReport {
    pub fn new() -> Self {
        Self {
            blocks_ok: true,
            entries_ok: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            live_entries: 0,
            used_blocks: 0,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub(crate) fn block_error(&mut self, msg: String) {
        self.errors.push(msg);
        self.blocks_ok = false;
    }

    pub(crate) fn entry_error(&mut self, msg: String) {
        self.errors.push(msg);
        self.entries_ok = false;
    }

    pub(crate) fn warn(&mut self, msg: String) {
        self.warnings.push(msg);
    }
}

impl Default for FsckReport {
    fn default() -> Self {
        Self::new()
    }
}
