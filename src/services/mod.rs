pub mod dpop;
