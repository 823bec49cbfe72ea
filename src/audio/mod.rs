// Module audio - Gestion du backend CPAL, du graphe de rendu et de l'export

pub mod clock;
pub mod context;
pub mod device;
pub mod dsp_utils;
pub mod export;
pub mod format_conversion;
pub mod graph;
pub mod parameters;
pub mod status;
