//! Integration tests for OpenAPI decoding and binding

use apiconv_common::{ConverterError, HttpMethod, ParameterLocation, TypeSpec};
use apiconv_parser::{parse_openapi, OpenApiParser, ParseOptions};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::io::Write;

const PETSTORE_YAML: &str = r##"openapi: 3.0.0
info:
  title: Swagger Petstore
  version: 1.0.0
  description: |
    A sample API that uses a petstore
    as an example.
servers:
  - url: http://petstore.swagger.io/v1
    description: Production
tags:
  - name: pets
paths:
  /pets:
    get:
      summary: List all pets
      operationId: listPets
      tags: [pets]
      parameters:
        - name: limit
          in: query
          description: How many items to return at one time (max 100)
          required: false
          schema:
            type: integer
            format: int32
      responses:
        '200':
          description: A paged array of pets
          headers:
            x-next:
              description: A link to the next page of responses
              schema:
                type: string
          content:
            application/json:
              schema:
                $ref: "#/components/schemas/Pets"
    post:
      summary: Create a pet
      operationId: createPets
      requestBody:
        required: true
        content:
          application/json:
            schema:
              $ref: '#/components/schemas/Pet'
            example: {id: 1, name: Rex}
      responses:
        '201':
          description: Null response
  /pets/{petId}:
    get:
      operationId: showPetById
      parameters:
        - name: petId
          in: path
          required: true
          schema:
            type: string
      responses:
        default:
          description: unexpected error
components:
  schemas:
    Pet:
      type: object
      required:
        - id
        - name
      properties:
        id:
          type: integer
          format: int64
        name:
          type: string
        tag:
          type: [string, 'null']
        status:
          type: string
          enum: [available, sold]
    Pets:
      type: array
      items:
        $ref: "#/components/schemas/Pet"
    Dog:
      allOf:
        - $ref: '#/components/schemas/Pet'
        - type: object
          properties:
            bark:
              type: boolean
      x-internal: true
"##;

#[test]
fn test_petstore_yaml_binds() {
    let document = parse_openapi(PETSTORE_YAML).unwrap();

    assert_eq!(document.openapi, "3.0.0");
    assert_eq!(document.info.title, "Swagger Petstore");
    assert_eq!(document.info.version, "1.0.0");
    assert_eq!(
        document.description(),
        Some("A sample API that uses a petstore\nas an example.")
    );
    assert_eq!(document.servers[0].url, "http://petstore.swagger.io/v1");
    assert_eq!(document.tags[0].name, "pets");
    assert_eq!(document.operation_count(), 3);
}

#[test]
fn test_operations_and_parameters() {
    let document = parse_openapi(PETSTORE_YAML).unwrap();

    let list = document.paths["/pets"].operation(HttpMethod::Get).unwrap();
    assert_eq!(list.operation_id.as_deref(), Some("listPets"));
    assert_eq!(list.tags, vec!["pets".to_string()]);

    let limit = &list.parameters[0];
    assert_eq!(limit.location, ParameterLocation::Query);
    assert!(!limit.required);
    let schema = limit.schema.as_ref().unwrap();
    assert_eq!(schema.type_name(), Some("integer"));
    assert_eq!(schema.format.as_deref(), Some("int32"));

    let ok = &list.responses["200"];
    assert_eq!(ok.headers["x-next"].schema.as_ref().unwrap().type_name(), Some("string"));
    let pets = ok.content["application/json"].schema.as_ref().unwrap();
    assert_eq!(pets.referenced_name(), Some("Pets"));

    let create = document.paths["/pets"].operation(HttpMethod::Post).unwrap();
    let body = create.request_body.as_ref().unwrap();
    assert!(body.required);
    assert_eq!(
        body.content["application/json"].example,
        Some(json!({"id": 1, "name": "Rex"}))
    );

    let show = document.paths["/pets/{petId}"]
        .operation(HttpMethod::Get)
        .unwrap();
    assert_eq!(show.parameters[0].location, ParameterLocation::Path);
    assert!(show.responses.contains_key("default"));
}

#[test]
fn test_component_schemas() {
    let document = parse_openapi(PETSTORE_YAML).unwrap();
    let schemas = document.named_schemas().unwrap();

    let pet = &schemas["Pet"];
    assert_eq!(pet.required, vec!["id".to_string(), "name".to_string()]);
    assert_eq!(
        pet.properties["tag"].schema_type,
        Some(TypeSpec::Union(vec!["string".into(), "null".into()]))
    );
    assert_eq!(
        pet.properties["status"].enum_values,
        vec![json!("available"), json!("sold")]
    );

    let pets = &schemas["Pets"];
    let items = pets.items.as_ref().unwrap();
    assert!(items.is_reference());
    assert!(document.resolve_schema_ref(items.ref_path.as_deref().unwrap()).is_some());

    let dog = &schemas["Dog"];
    assert_eq!(dog.all_of.len(), 2);
    assert_eq!(dog.all_of[0].referenced_name(), Some("Pet"));
    assert_eq!(dog.extensions["x-internal"], json!(true));
}

#[test]
fn test_json_input_binds_the_same_model() {
    let json_text = serde_json::to_string(&parse_openapi(PETSTORE_YAML).unwrap()).unwrap();
    let from_json = parse_openapi(&json_text).unwrap();
    assert_eq!(from_json, parse_openapi(PETSTORE_YAML).unwrap());
}

#[test]
fn test_shape_mismatch_is_a_binding_error() {
    let result = parse_openapi("openapi: 3.0.0\ninfo:\n  title: Bad\npaths:\n  - /not-a-map\n");
    assert!(matches!(result, Err(ConverterError::Binding(_))));
}

#[test]
fn test_from_file() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(PETSTORE_YAML.as_bytes()).unwrap();

    let parser = OpenApiParser::from_file(file.path(), &ParseOptions::default()).unwrap();
    assert!(parser.value().get("paths").is_some());
    let document = parser.parse().unwrap();
    assert_eq!(document.paths.len(), 2);
}

#[test]
fn test_missing_file_is_a_parse_error() {
    let result = OpenApiParser::from_file("/nonexistent/petstore.yaml", &ParseOptions::default());
    assert!(matches!(result, Err(ConverterError::Parse(_))));
}
