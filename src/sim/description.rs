use crate::DescriptionParameters;

pub static DESCRIPTION_TARGET: &'static str = "robot_description";

/// Name of the robot description template inside the description directory.
pub static DEFAULT_DESCRIPTION_TEMPLATE: &'static str = "andino.urdf.xacro";

/// Loads all description templates matching the glob, typically
/// `<package_dir>/description/*.xacro`.
pub fn load_templates(glob: &str) -> Result<tera::Tera, Box<dyn std::error::Error + Send + Sync>> {
    let templates = match tera::Tera::new(glob) {
        Ok(t) => t,
        Err(e) => {
            log::error!(target: DESCRIPTION_TARGET, "Description template parsing error(s): {}", e);
            return Err(Box::new(e));
        }
    };

    let template_names = templates
        .get_template_names()
        .map(|x| x.to_string())
        .collect::<Vec<String>>();
    if template_names.len() == 0 {
        log::error!(target: DESCRIPTION_TARGET, "Couldn't find any description templates at {}.", glob);
        return Err(format!("no description templates at {}", glob).into());
    }
    log::info!(target: DESCRIPTION_TARGET, "Found templates: {}.", template_names.join(", "));

    Ok(templates)
}

/// Renders the named template with the given substitution flags. Synchronous
/// and deterministic, reads nothing beyond the already loaded templates.
pub fn render_description(
    templates: &tera::Tera,
    template_name: &str,
    params: &DescriptionParameters,
) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let context = match tera::Context::from_serialize(params) {
        Ok(context) => context,
        Err(e) => {
            log::error!(target: DESCRIPTION_TARGET,
                "Creating a Tera Context from the description parameters failed with: {}.", e);
            return Err(Box::new(e));
        }
    };
    match templates.render(template_name, &context) {
        Ok(rendered) => Ok(rendered),
        Err(e) => {
            log::error!(target: DESCRIPTION_TARGET,
                "Rendering the {} template failed with: {}.", template_name, e);
            Err(Box::new(e))
        }
    }
}

/// Renders the robot description and parses it back as a structural sanity
/// check. A template that renders to a malformed description is fatal to
/// launch construction.
pub fn materialize_description(
    templates: &tera::Tera,
    template_name: &str,
    params: &DescriptionParameters,
) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let rendered = render_description(templates, template_name, params)?;
    match urdf_rs::read_from_string(&rendered) {
        Ok(robot) => {
            log::info!(target: DESCRIPTION_TARGET,
                "Generated robot description for '{}' with {} links and {} joints.",
                robot.name, robot.links.len(), robot.joints.len());
            Ok(rendered)
        }
        Err(e) => {
            log::error!(target: DESCRIPTION_TARGET,
                "The rendered {} document is not a valid robot description: {}.", template_name, e);
            Err(Box::new(e))
        }
    }
}

#[cfg(test)]
static TEST_TEMPLATE: &'static str = r#"<robot name="andino">
    <link name="base_link"/>
    <link name="caster_link"/>
    <joint name="caster_joint" type="{% if use_fixed_caster %}fixed{% else %}continuous{% endif %}">
        <parent link="base_link"/>
        <child link="caster_link"/>
        {% if not use_fixed_caster %}<axis xyz="0 1 0"/>{% endif %}
    </joint>
    <!-- gazebo_ros_control: {{ use_gazebo_ros_control }} -->
    {% if use_gazebo_ros_control %}
    <gazebo>
        <plugin name="gazebo_ros_control" filename="libgazebo_ros_control.so"/>
    </gazebo>
    {% endif %}
</robot>
"#;

#[cfg(test)]
fn test_templates() -> tera::Tera {
    let mut templates = tera::Tera::default();
    templates
        .add_raw_template("andino.urdf.xacro", TEST_TEMPLATE)
        .unwrap();
    templates
}

#[test]
fn test_render_with_both_flags_false() {
    let rendered = materialize_description(
        &test_templates(),
        "andino.urdf.xacro",
        &DescriptionParameters::default(),
    )
    .unwrap();
    assert!(rendered.contains("gazebo_ros_control: false"));
    assert!(rendered.contains(r#"type="continuous""#));
    assert!(!rendered.contains("<plugin"));
}

#[test]
fn test_render_with_flags_set() {
    let params = DescriptionParameters {
        use_gazebo_ros_control: true,
        use_fixed_caster: true,
    };
    let rendered = render_description(&test_templates(), "andino.urdf.xacro", &params).unwrap();
    assert!(rendered.contains(r#"type="fixed""#));
    assert!(rendered.contains("libgazebo_ros_control.so"));
}

#[test]
fn test_missing_template_is_fatal() {
    let result = render_description(
        &test_templates(),
        "nonexistent.urdf.xacro",
        &DescriptionParameters::default(),
    );
    assert!(result.is_err());
}

#[test]
fn test_load_templates_from_disk() {
    use std::io::Write;

    let dir = tempfile::tempdir().unwrap();
    let template_path = dir.path().join("andino.urdf.xacro");
    let mut file = std::fs::File::create(&template_path).unwrap();
    file.write_all(TEST_TEMPLATE.as_bytes()).unwrap();

    let glob = format!("{}/*.xacro", dir.path().to_string_lossy());
    let templates = load_templates(&glob).unwrap();
    let rendered = materialize_description(
        &templates,
        "andino.urdf.xacro",
        &DescriptionParameters::default(),
    )
    .unwrap();
    assert!(rendered.contains(r#"<robot name="andino">"#));
}

#[test]
fn test_load_templates_empty_dir_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let glob = format!("{}/*.xacro", dir.path().to_string_lossy());
    assert!(load_templates(&glob).is_err());
}

#[test]
fn test_malformed_description_is_fatal() {
    let mut templates = tera::Tera::default();
    templates
        .add_raw_template("broken.urdf.xacro", "<robot name=\"andino\"><link name=")
        .unwrap();
    let result = materialize_description(
        &templates,
        "broken.urdf.xacro",
        &DescriptionParameters::default(),
    );
    assert!(result.is_err());
}
