use validator::Validate;

use crate::{
    auth::{gate, Caller},
    errors::{AppError, AppResult},
    models::{
        domain::{Course, Lesson, Resource},
        dto::{
            request::{CreateResourceRequest, UpdateResourceRequest},
            response::ResourceDto,
        },
    },
    repositories::Repositories,
    services::{course_service::visible_to_student, lookup},
};

/// Course-level and lesson-scoped resources. `lesson_id` is `Some` when the
/// request came through a lesson path.
pub struct ResourceService {
    repos: Repositories,
}

impl ResourceService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn list(
        &self,
        caller: &Caller,
        course_id: &str,
        lesson_id: Option<&str>,
    ) -> AppResult<Vec<ResourceDto>> {
        let course = lookup::find_course(self.repos.courses.as_ref(), course_id).await?;
        gate::require_course_visible(caller, &course)?;

        let resources = match lookup::find_scope(self.repos.lessons.as_ref(), &course, lesson_id).await? {
            Some(lesson) => {
                gate::require_lesson_visible(caller, &lesson)?;
                self.repos.resources.list_by_lesson(&course.id, &lesson.id).await?
            }
            None => {
                let mut resources = self.repos.resources.list_by_course(&course.id).await?;
                if caller.is_student() {
                    let published = self.repos.lessons.published_ids(&course.id).await?;
                    resources.retain(|r| visible_to_student(r.lesson_id.as_ref(), &published));
                }
                resources
            }
        };

        Ok(resources.into_iter().map(ResourceDto::from).collect())
    }

    pub async fn create(
        &self,
        caller: &Caller,
        course_id: &str,
        lesson_id: Option<&str>,
        request: CreateResourceRequest,
    ) -> AppResult<ResourceDto> {
        let (course, scope) = self.owned_scope(caller, course_id, lesson_id).await?;
        request.validate()?;

        let resource = Resource::from_request(course.id, scope.map(|l| l.id), request);
        let resource = self.repos.resources.create(resource).await?;
        Ok(resource.into())
    }

    pub async fn update(
        &self,
        caller: &Caller,
        course_id: &str,
        lesson_id: Option<&str>,
        resource_id: &str,
        request: UpdateResourceRequest,
    ) -> AppResult<ResourceDto> {
        let (course, scope) = self.owned_scope(caller, course_id, lesson_id).await?;
        let mut resource = self.find_in_scope(&course, scope.as_ref(), resource_id).await?;
        request.validate()?;

        resource.apply_patch(request);
        let resource = self.repos.resources.update(resource).await?;
        Ok(resource.into())
    }

    pub async fn delete(
        &self,
        caller: &Caller,
        course_id: &str,
        lesson_id: Option<&str>,
        resource_id: &str,
    ) -> AppResult<()> {
        let (course, scope) = self.owned_scope(caller, course_id, lesson_id).await?;
        let resource = self.find_in_scope(&course, scope.as_ref(), resource_id).await?;

        self.repos.resources.delete(&resource.id).await
    }

    async fn owned_scope(
        &self,
        caller: &Caller,
        course_id: &str,
        lesson_id: Option<&str>,
    ) -> AppResult<(Course, Option<Lesson>)> {
        let course = lookup::find_course(self.repos.courses.as_ref(), course_id).await?;
        gate::require_course_owner(caller, &course)?;
        let scope = lookup::find_scope(self.repos.lessons.as_ref(), &course, lesson_id).await?;
        Ok((course, scope))
    }

    async fn find_in_scope(
        &self,
        course: &Course,
        scope: Option<&Lesson>,
        resource_id: &str,
    ) -> AppResult<Resource> {
        let id = lookup::parse_nested_id(resource_id, "resource")?;
        let resource = self
            .repos
            .resources
            .find_by_id(&id)
            .await?
            .ok_or_else(|| AppError::not_found("resource"))?;
        lookup::require_in_scope(
            course,
            scope,
            &resource.course_id,
            resource.lesson_id.as_ref(),
            "resource",
        )?;
        Ok(resource)
    }
}
