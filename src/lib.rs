// Library entry exposing formatter modules.
pub mod format;
pub mod phpdoc;
pub mod printer;
pub mod project;
pub mod syntax;
pub mod token;
