//! TypeScript type generation module.
//!
//! Exports TypeScript definitions for the API's request and response types.
//! Runs as a test so bindings are refreshed by `cargo test`.

#[cfg(test)]
mod tests {
    use std::{env, path::Path};

    use ts_rs::TS;

    #[test]
    fn generate_typescript_types() {
        // Output directory, in order of preference:
        // 1. Environment variable PLACEMENT_TS_OUTPUT_DIR
        // 2. ../ts-bindings
        let output_dir_str = env::var("PLACEMENT_TS_OUTPUT_DIR")
            .unwrap_or_else(|_| "../ts-bindings".to_string());
        let output_dir = Path::new(&output_dir_str);

        if !output_dir.exists() {
            std::fs::create_dir_all(output_dir).expect("Failed to create output directory");
        }

        // Remove stale .ts files so renamed or deleted types don't linger
        for entry in std::fs::read_dir(output_dir).expect("Failed to read output directory") {
            let path = entry.expect("Failed to read directory entry").path();
            if path.extension().and_then(|s| s.to_str()) == Some("ts") {
                std::fs::remove_file(&path)
                    .unwrap_or_else(|e| panic!("Failed to remove {:?}: {}", path, e));
            }
        }

        unsafe {
            env::set_var("TS_RS_EXPORT_DIR", output_dir);
        }

        use crate::analytics::insights::{AiInsightsReport, Insight};
        use crate::analytics::post_analysis::PostAnalysisReport;
        use crate::analytics::pre_analysis::PreAnalysisReport;
        use crate::api::ErrorResponse;
        use crate::api::dashboard::Dashboard;
        use crate::api::login::{CurrentUser, LoginResponse};
        use crate::api::status::HealthStatus;
        use crate::models::*;
        use crate::permissions::{Permission, Role};

        // Records
        User::export().expect("Failed to export User type");
        UserInput::export().expect("Failed to export UserInput type");
        Student::export().expect("Failed to export Student type");
        StudentInput::export().expect("Failed to export StudentInput type");
        StudentUpdate::export().expect("Failed to export StudentUpdate type");
        StudentStatus::export().expect("Failed to export StudentStatus type");
        Company::export().expect("Failed to export Company type");
        CompanyInput::export().expect("Failed to export CompanyInput type");
        CompanyUpdate::export().expect("Failed to export CompanyUpdate type");
        Placement::export().expect("Failed to export Placement type");
        PlacementInput::export().expect("Failed to export PlacementInput type");
        PlacementWithDetails::export().expect("Failed to export PlacementWithDetails type");

        // Access control
        Role::export().expect("Failed to export Role type");
        Permission::export().expect("Failed to export Permission type");

        // API responses
        ErrorResponse::export().expect("Failed to export ErrorResponse type");
        LoginResponse::export().expect("Failed to export LoginResponse type");
        CurrentUser::export().expect("Failed to export CurrentUser type");
        HealthStatus::export().expect("Failed to export HealthStatus type");
        Dashboard::export().expect("Failed to export Dashboard type");

        // Analytics reports; export_all pulls in the nested types
        PostAnalysisReport::export_all().expect("Failed to export PostAnalysisReport types");
        PreAnalysisReport::export_all().expect("Failed to export PreAnalysisReport types");
        AiInsightsReport::export_all().expect("Failed to export AiInsightsReport types");
        Insight::export().expect("Failed to export Insight type");

        println!("TypeScript types generated successfully in {:?}", output_dir);
    }
}
