//! Previously deployed state, used for route retention and blue/green swaps.

mod types;

pub use types::*;

impl DeployedMta {
  /// The live application deployed for a module.
  ///
  /// Module names are compared case-insensitively.
  pub fn find_application(&self, module_name: &str) -> Option<&DeployedMtaApplication> {
    self.applications.iter().find(|app| {
      app.module_name.eq_ignore_ascii_case(module_name) && app.productization_state == ProductizationState::Live
    })
  }

  pub fn find_service(&self, name: &str) -> Option<&DeployedMtaService> {
    self.services.iter().find(|s| s.name == name)
  }
}
